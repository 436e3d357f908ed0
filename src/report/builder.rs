use chrono::{Local, NaiveDate};
use std::collections::{HashMap, HashSet};
use tracing::debug;

use super::model::{
    Dimension, DistributionMode, GroupBody, LeafId, ReportGroup, ReportResponse, ReportRow,
    ReportType,
};
use super::orders::{date_label, normalize_orders, DateMode, LineItem, Order, OrderStatus};
use super::totals::aggregate;
use crate::error::{ClosingError, Result};

/// Row filters declared by the request. The backend query already applied them; the builder
/// re-checks so nothing outside the declared window is admitted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportFilters {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub date_mode: DateMode,
    pub status: Option<OrderStatus>,
    pub client: Option<String>,
    pub designer: Option<String>,
    pub seller: Option<String>,
}

impl ReportFilters {
    pub fn validate(&self) -> Result<()> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(ClosingError::InvalidPeriod {
                    start: start.to_string(),
                    end: end.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Rows without a reference date are admitted; the end date is inclusive.
    pub fn admits(&self, item: &LineItem) -> bool {
        if let Some(date) = item.reference_date(self.date_mode) {
            if self.start_date.is_some_and(|start| date < start) {
                return false;
            }
            if self.end_date.is_some_and(|end| date > end) {
                return false;
            }
        }
        if self.status.is_some_and(|status| item.status != status) {
            return false;
        }
        matches_substring(&item.client, self.client.as_deref())
            && matches_substring(&item.designer, self.designer.as_deref())
            && matches_substring(&item.seller, self.seller.as_deref())
    }

    pub fn period_label(&self) -> String {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) if start == end => {
                format!("Period: {}", date_label(Some(start)))
            }
            (Some(start), Some(end)) => format!(
                "Period: {} - {}",
                date_label(Some(start)),
                date_label(Some(end))
            ),
            (Some(start), None) => format!("Period from {}", date_label(Some(start))),
            (None, Some(end)) => format!("Period until {}", date_label(Some(end))),
            (None, None) => "Period not specified".to_string(),
        }
    }

    pub fn status_label(&self) -> String {
        match self.status {
            Some(status) => format!("Status: {status}"),
            None => "Status: All".to_string(),
        }
    }
}

fn matches_substring(value: &str, needle: Option<&str>) -> bool {
    match needle.map(str::trim) {
        Some(n) if !n.is_empty() => value.to_lowercase().contains(&n.to_lowercase()),
        _ => true,
    }
}

/// Parse a request date (`YYYY-MM-DD`)
pub fn parse_request_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| ClosingError::InvalidDate(value.to_string()))
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportRequest {
    pub report_type: ReportType,
    pub filters: ReportFilters,
    pub distribution: DistributionMode,
}

impl ReportRequest {
    pub fn new(report_type: ReportType) -> Self {
        Self {
            report_type,
            filters: ReportFilters::default(),
            distribution: DistributionMode::default(),
        }
    }
}

/// Produce a full report from fetched orders
pub fn generate_report(orders: &[Order], request: &ReportRequest) -> Result<ReportResponse> {
    request.filters.validate()?;

    let items = normalize_orders(orders, request.distribution);
    let admitted: Vec<&LineItem> = items
        .iter()
        .filter(|item| request.filters.admits(item))
        .collect();
    debug!(
        orders = orders.len(),
        items = items.len(),
        admitted = admitted.len(),
        report_type = %request.report_type,
        "building closings report"
    );

    let groups = group_items(
        &admitted,
        request.report_type,
        request.filters.date_mode,
        request.distribution,
    );
    let rows: Vec<ReportRow> = admitted.iter().map(|item| item.to_row()).collect();
    let total = aggregate(&rows, request.distribution);

    Ok(ReportResponse {
        title: request.report_type.title().to_string(),
        period_label: request.filters.period_label(),
        status_label: request.filters.status_label(),
        generated_at: Local::now().format("%d/%m/%Y %H:%M:%S").to_string(),
        report_type: request.report_type,
        distribution: request.distribution,
        groups,
        total,
    })
}

/// Filter line items and group them into the report tree
pub fn build(
    items: &[LineItem],
    report_type: ReportType,
    filters: &ReportFilters,
    mode: DistributionMode,
) -> Vec<ReportGroup> {
    let admitted: Vec<&LineItem> = items.iter().filter(|item| filters.admits(item)).collect();
    group_items(&admitted, report_type, filters.date_mode, mode)
}

fn group_items(
    items: &[&LineItem],
    report_type: ReportType,
    date_mode: DateMode,
    mode: DistributionMode,
) -> Vec<ReportGroup> {
    let (primary, secondary) = report_type.dimensions();
    let summary_only = report_type.keeps_summary_only();
    let mut keys = SiblingKeys::default();

    partition(items, primary, date_mode)
        .into_iter()
        .map(|(value, members)| {
            let key = keys.claim(&value);
            let label = format!("{}: {}", primary.label(), value);
            let Some(secondary) = secondary else {
                return leaf_group(&[key.as_str()], label, value, &members, summary_only, mode);
            };

            let mut sub_keys = SiblingKeys::default();
            let subgroups: Vec<ReportGroup> = partition(&members, secondary, date_mode)
                .into_iter()
                .map(|(sub_value, sub_members)| {
                    let sub_key = sub_keys.claim(&sub_value);
                    let sub_label = format!("{}: {}", secondary.label(), sub_value);
                    leaf_group(
                        &[key.as_str(), sub_key.as_str()],
                        sub_label,
                        sub_value,
                        &sub_members,
                        summary_only,
                        mode,
                    )
                })
                .collect();
            let subtotal = aggregate(&to_rows(&members), mode);

            ReportGroup {
                key,
                label,
                value,
                body: GroupBody::Subgroups { groups: subgroups },
                subtotal,
            }
        })
        .collect()
}

fn leaf_group(
    key_path: &[&str],
    label: String,
    value: String,
    members: &[&LineItem],
    summary_only: bool,
    mode: DistributionMode,
) -> ReportGroup {
    let rows = to_rows(members);
    let subtotal = aggregate(&rows, mode);
    let body = if summary_only {
        let orders: HashSet<u64> = rows.iter().map(|row| row.order_id).collect();
        GroupBody::Summary {
            id: LeafId::group(key_path),
            orders: orders.len(),
            items: rows.len(),
        }
    } else {
        GroupBody::Rows { rows }
    };

    ReportGroup {
        key: key_path.last().map(|k| k.to_string()).unwrap_or_default(),
        label,
        value,
        body,
        subtotal,
    }
}

fn to_rows(items: &[&LineItem]) -> Vec<ReportRow> {
    items.iter().map(|item| item.to_row()).collect()
}

/// Split items by dimension value, keeping first-appearance order
fn partition<'a>(
    items: &[&'a LineItem],
    dimension: Dimension,
    date_mode: DateMode,
) -> Vec<(String, Vec<&'a LineItem>)> {
    let mut buckets: Vec<(String, Vec<&'a LineItem>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for item in items {
        let value = item.dimension_value(dimension, date_mode);
        match index.get(&value) {
            Some(&i) => buckets[i].1.push(*item),
            None => {
                index.insert(value.clone(), buckets.len());
                buckets.push((value, vec![*item]));
            }
        }
    }

    buckets
}

/// Hands out slug keys that stay unique among siblings
#[derive(Default)]
struct SiblingKeys {
    used: HashSet<String>,
}

impl SiblingKeys {
    fn claim(&mut self, value: &str) -> String {
        let mut base = slug::slugify(value);
        if base.is_empty() {
            base = "group".to_string();
        }
        let mut key = base.clone();
        let mut n = 2;
        while !self.used.insert(key.clone()) {
            key = format!("{base}-{n}");
            n += 1;
        }
        key
    }
}
