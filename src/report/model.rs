use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;

use crate::error::ClosingError;

/// A money amount held as integer cents
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Convert a decimal amount, rounding to the nearest cent. Non-finite values become zero
    /// and out-of-range values clamp to the representable extremes.
    pub fn from_units(value: f64) -> Self {
        if !value.is_finite() {
            return Money::ZERO;
        }
        Money((value * 100.0).round() as i64)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    pub fn to_units(self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Split into `parts` shares that sum exactly to `self`; the first shares absorb the
    /// leftover cents.
    pub fn split(self, parts: usize) -> Vec<Money> {
        if parts == 0 {
            return Vec::new();
        }
        let n = parts as i64;
        let base = self.0.div_euclid(n);
        let remainder = self.0.rem_euclid(n);
        (0..n)
            .map(|i| Money(base + i64::from(i < remainder)))
            .collect()
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

/// How an order's freight is attributed to its line items
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DistributionMode {
    /// Every row carries the order's full freight; totals count it once per order
    #[default]
    PerOrder,
    /// Every row carries a disjoint slice of the order's freight
    Proportional,
}

impl DistributionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            DistributionMode::PerOrder => "per-order",
            DistributionMode::Proportional => "proportional",
        }
    }
}

impl fmt::Display for DistributionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistributionMode {
    type Err = ClosingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "per-order" | "per_order" | "order" => Ok(DistributionMode::PerOrder),
            "proportional" => Ok(DistributionMode::Proportional),
            _ => Err(ClosingError::UnknownDistribution(s.to_string())),
        }
    }
}

/// Identifier of a selectable leaf: a row (`"{order}:{item}"`) or a summary group (key path)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeafId(String);

impl LeafId {
    pub fn new(id: impl Into<String>) -> Self {
        LeafId(id.into())
    }

    pub fn row(order_id: u64, item_index: usize) -> Self {
        LeafId(format!("{order_id}:{item_index}"))
    }

    pub fn group(keys: &[&str]) -> Self {
        LeafId(keys.join("/"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LeafId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LeafId {
    fn from(value: &str) -> Self {
        LeafId(value.to_string())
    }
}

impl From<String> for LeafId {
    fn from(value: String) -> Self {
        LeafId(value)
    }
}

/// One production line item in a report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub id: LeafId,
    pub ticket: String,
    pub description: String,
    pub order_id: u64,
    pub freight: Money,
    pub service: Money,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportTotals {
    pub freight: Money,
    pub service: Money,
}

impl ReportTotals {
    pub const ZERO: ReportTotals = ReportTotals {
        freight: Money::ZERO,
        service: Money::ZERO,
    };

    pub fn new(freight: Money, service: Money) -> Self {
        Self { freight, service }
    }

    /// Freight plus service
    pub fn total(&self) -> Money {
        self.freight + self.service
    }
}

impl Add for ReportTotals {
    type Output = ReportTotals;

    fn add(self, rhs: ReportTotals) -> ReportTotals {
        ReportTotals {
            freight: self.freight + rhs.freight,
            service: self.service + rhs.service,
        }
    }
}

impl AddAssign for ReportTotals {
    fn add_assign(&mut self, rhs: ReportTotals) {
        *self = *self + rhs;
    }
}

/// What a report node holds below its header
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GroupBody {
    Subgroups { groups: Vec<ReportGroup> },
    Rows { rows: Vec<ReportRow> },
    /// Aggregated leaf whose rows were discarded after computing the subtotal
    Summary { id: LeafId, orders: usize, items: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportGroup {
    pub key: String,
    pub label: String,
    /// Raw dimension value behind the label (e.g. the designer's name)
    pub value: String,
    pub body: GroupBody,
    pub subtotal: ReportTotals,
}

impl ReportGroup {
    pub fn subgroups(&self) -> &[ReportGroup] {
        match &self.body {
            GroupBody::Subgroups { groups } => groups,
            _ => &[],
        }
    }

    pub fn rows(&self) -> &[ReportRow] {
        match &self.body {
            GroupBody::Rows { rows } => rows,
            _ => &[],
        }
    }

    pub fn is_leaf(&self) -> bool {
        !matches!(self.body, GroupBody::Subgroups { .. })
    }
}

/// Structural address of a node: child indices from the root
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ReportPath(Vec<usize>);

impl ReportPath {
    pub fn root() -> Self {
        ReportPath(Vec::new())
    }

    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        ReportPath(indices)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

impl From<Vec<usize>> for ReportPath {
    fn from(indices: Vec<usize>) -> Self {
        ReportPath(indices)
    }
}

impl fmt::Display for ReportPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|i| i.to_string()).collect();
        write!(f, "/{}", parts.join("/"))
    }
}

/// A value a report can be grouped by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Designer,
    Client,
    Seller,
    ProductionType,
    Delivery,
    /// Reference date chosen by the request's date mode
    Date,
    EntryDate,
    DeliveryDate,
}

impl Dimension {
    pub fn label(self) -> &'static str {
        match self {
            Dimension::Designer => "Designer",
            Dimension::Client => "Client",
            Dimension::Seller => "Seller",
            Dimension::ProductionType => "Type",
            Dimension::Delivery => "Delivery",
            Dimension::Date | Dimension::EntryDate | Dimension::DeliveryDate => "Date",
        }
    }

    /// Whether every line item of one order shares the same value
    pub fn is_order_level(self) -> bool {
        !matches!(
            self,
            Dimension::Designer | Dimension::Seller | Dimension::ProductionType
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportShape {
    /// Two dimensions, leaves keep their rows
    Analytic,
    /// Totals per group, one line per leaf group
    Synthetic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportType {
    AnalyticDesignerClient,
    AnalyticClientDesigner,
    AnalyticClientProduction,
    AnalyticDesignerProduction,
    AnalyticDeliveryProduction,
    SyntheticDate,
    SyntheticEntryDate,
    SyntheticDeliveryDate,
    SyntheticDesigner,
    SyntheticClient,
    SyntheticDelivery,
    SyntheticSeller,
    SyntheticSellerDesigner,
}

impl ReportType {
    pub const ALL: [ReportType; 13] = [
        ReportType::AnalyticDesignerClient,
        ReportType::AnalyticClientDesigner,
        ReportType::AnalyticClientProduction,
        ReportType::AnalyticDesignerProduction,
        ReportType::AnalyticDeliveryProduction,
        ReportType::SyntheticDate,
        ReportType::SyntheticEntryDate,
        ReportType::SyntheticDeliveryDate,
        ReportType::SyntheticDesigner,
        ReportType::SyntheticClient,
        ReportType::SyntheticDelivery,
        ReportType::SyntheticSeller,
        ReportType::SyntheticSellerDesigner,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ReportType::AnalyticDesignerClient => "analytic-designer-client",
            ReportType::AnalyticClientDesigner => "analytic-client-designer",
            ReportType::AnalyticClientProduction => "analytic-client-production",
            ReportType::AnalyticDesignerProduction => "analytic-designer-production",
            ReportType::AnalyticDeliveryProduction => "analytic-delivery-production",
            ReportType::SyntheticDate => "synthetic-date",
            ReportType::SyntheticEntryDate => "synthetic-entry-date",
            ReportType::SyntheticDeliveryDate => "synthetic-delivery-date",
            ReportType::SyntheticDesigner => "synthetic-designer",
            ReportType::SyntheticClient => "synthetic-client",
            ReportType::SyntheticDelivery => "synthetic-delivery",
            ReportType::SyntheticSeller => "synthetic-seller",
            ReportType::SyntheticSellerDesigner => "synthetic-seller-designer",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ReportType::AnalyticDesignerClient => "Analytic Report - Designer x Client",
            ReportType::AnalyticClientDesigner => "Analytic Report - Client x Designer",
            ReportType::AnalyticClientProduction => "Analytic Report - Client x Production Type",
            ReportType::AnalyticDesignerProduction => {
                "Analytic Report - Designer x Production Type"
            }
            ReportType::AnalyticDeliveryProduction => {
                "Analytic Report - Delivery Method x Production Type"
            }
            ReportType::SyntheticDate => "Synthetic Report - Totals by Date",
            ReportType::SyntheticEntryDate => "Synthetic Report - Totals by Entry Date",
            ReportType::SyntheticDeliveryDate => "Synthetic Report - Totals by Delivery Date",
            ReportType::SyntheticDesigner => "Synthetic Report - Totals by Designer",
            ReportType::SyntheticClient => "Synthetic Report - Totals by Client",
            ReportType::SyntheticDelivery => "Synthetic Report - Totals by Delivery Method",
            ReportType::SyntheticSeller => "Synthetic Report - Totals by Seller",
            ReportType::SyntheticSellerDesigner => "Synthetic Report - Seller x Designer",
        }
    }

    pub fn shape(self) -> ReportShape {
        if self.key().starts_with("analytic") {
            ReportShape::Analytic
        } else {
            ReportShape::Synthetic
        }
    }

    /// Primary dimension and optional secondary dimension
    pub fn dimensions(self) -> (Dimension, Option<Dimension>) {
        use Dimension::*;
        match self {
            ReportType::AnalyticDesignerClient => (Designer, Some(Client)),
            ReportType::AnalyticClientDesigner => (Client, Some(Designer)),
            ReportType::AnalyticClientProduction => (Client, Some(ProductionType)),
            ReportType::AnalyticDesignerProduction => (Designer, Some(ProductionType)),
            ReportType::AnalyticDeliveryProduction => (Delivery, Some(ProductionType)),
            ReportType::SyntheticDate => (Date, None),
            ReportType::SyntheticEntryDate => (EntryDate, None),
            ReportType::SyntheticDeliveryDate => (DeliveryDate, None),
            ReportType::SyntheticDesigner => (Designer, None),
            ReportType::SyntheticClient => (Client, None),
            ReportType::SyntheticDelivery => (Delivery, None),
            ReportType::SyntheticSeller => (Seller, None),
            ReportType::SyntheticSellerDesigner => (Seller, Some(Designer)),
        }
    }

    /// Whether leaves may drop their rows after aggregation. Only safe when the leaf
    /// dimension keeps every order inside a single group.
    pub fn keeps_summary_only(self) -> bool {
        if self.shape() == ReportShape::Analytic {
            return false;
        }
        let (primary, secondary) = self.dimensions();
        primary.is_order_level() && secondary.map_or(true, Dimension::is_order_level)
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ReportType {
    type Err = ClosingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        ReportType::ALL
            .into_iter()
            .find(|t| t.key() == wanted)
            .ok_or_else(|| ClosingError::UnknownReportType(s.to_string()))
    }
}

/// A generated closings report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportResponse {
    pub title: String,
    pub period_label: String,
    pub status_label: String,
    pub generated_at: String,
    pub report_type: ReportType,
    pub distribution: DistributionMode,
    pub groups: Vec<ReportGroup>,
    pub total: ReportTotals,
}

impl ReportResponse {
    pub fn shape(&self) -> ReportShape {
        self.report_type.shape()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_saturates_instead_of_overflowing() {
        let huge = Money::from_units(1e30);
        assert_eq!(huge, Money::from_cents(i64::MAX));
        assert_eq!(huge + Money::from_cents(1), huge);

        let mut total = huge;
        total += huge;
        assert_eq!(total, huge);

        let floor = Money::from_cents(i64::MIN) - Money::from_cents(1);
        assert_eq!(floor, Money::from_cents(i64::MIN));
        let sum: Money = [huge, huge, Money::from_cents(-5)].into_iter().sum();
        assert_eq!(sum, Money::from_cents(i64::MAX - 5));
    }

    #[test]
    fn split_spreads_leftover_cents_over_first_shares() {
        let shares = Money::from_cents(1000).split(3);
        assert_eq!(
            shares,
            vec![
                Money::from_cents(334),
                Money::from_cents(333),
                Money::from_cents(333)
            ]
        );
        assert_eq!(shares.into_iter().sum::<Money>(), Money::from_cents(1000));
        assert!(Money::from_cents(500).split(0).is_empty());
    }

    #[test]
    fn money_display_keeps_two_decimals() {
        assert_eq!(Money::from_units(12.5).to_string(), "12.50");
        assert_eq!(Money::from_cents(-5).to_string(), "-0.05");
        assert_eq!(Money::from_units(f64::NAN), Money::ZERO);
    }

    #[test]
    fn report_type_parses_keys_and_underscores() {
        assert_eq!(
            "synthetic_client".parse::<ReportType>().unwrap(),
            ReportType::SyntheticClient
        );
        assert!("weekly".parse::<ReportType>().is_err());
    }

    #[test]
    fn summary_only_leaves_require_order_level_dimensions() {
        assert!(ReportType::SyntheticClient.keeps_summary_only());
        assert!(ReportType::SyntheticDate.keeps_summary_only());
        assert!(!ReportType::SyntheticDesigner.keeps_summary_only());
        assert!(!ReportType::SyntheticSellerDesigner.keeps_summary_only());
        assert!(!ReportType::AnalyticClientDesigner.keeps_summary_only());
    }

    #[test]
    fn paths_compare_structurally() {
        let a = ReportPath::root().child(1).child(0);
        let b = ReportPath::from(vec![1, 0]);
        assert_eq!(a, b);
        assert_ne!(a, ReportPath::from(vec![10]));
        assert_eq!(a.to_string(), "/1/0");
    }
}
