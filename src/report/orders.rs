use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use super::model::{Dimension, DistributionMode, LeafId, Money, ReportRow};
use crate::error::{ClosingError, Result};

pub const NO_CLIENT: &str = "No client";
pub const NO_DESIGNER: &str = "No designer";
pub const NO_SELLER: &str = "No seller";
pub const NO_TYPE: &str = "No type";
pub const NO_DELIVERY: &str = "No delivery method";
pub const NO_DATE: &str = "No date";
pub const NO_DESCRIPTION: &str = "Item without description";
pub const EMPTY_ORDER: &str = "Order without items";

const DATE_LABEL_FORMAT: &str = "%d/%m/%Y";

/// A money value as the backend sends it: a number or a (possibly Brazilian-formatted) string
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MoneyInput {
    Number(f64),
    Text(String),
}

impl MoneyInput {
    pub fn to_money(&self) -> Money {
        match self {
            MoneyInput::Number(value) => Money::from_units(*value),
            MoneyInput::Text(text) => parse_money(text),
        }
    }
}

/// Parse `"1234.56"` or `"1.234,56"`. Anything unparsable is zero.
pub fn parse_money(text: &str) -> Money {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Money::ZERO;
    }
    let sanitised = if trimmed.contains(',') {
        trimmed.replace('.', "").replace(',', ".")
    } else {
        trimmed.to_string()
    };
    sanitised
        .parse::<f64>()
        .map(Money::from_units)
        .unwrap_or(Money::ZERO)
}

fn money_or_zero(value: &Option<MoneyInput>) -> Money {
    value.as_ref().map(MoneyInput::to_money).unwrap_or_default()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    #[serde(alias = "Pendente", alias = "Pending")]
    Pending,
    #[serde(alias = "Em Processamento", alias = "In Progress")]
    InProgress,
    #[serde(alias = "Concluido", alias = "Done")]
    Done,
    #[serde(alias = "Cancelado", alias = "Cancelled")]
    Cancelled,
    #[default]
    #[serde(other)]
    Unknown,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::InProgress => "In Progress",
            OrderStatus::Done => "Done",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::Unknown => "Unknown",
        };
        f.write_str(label)
    }
}

impl FromStr for OrderStatus {
    type Err = ClosingError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(' ', "-").as_str() {
            "pending" | "pendente" => Ok(OrderStatus::Pending),
            "in-progress" | "em-processamento" => Ok(OrderStatus::InProgress),
            "done" | "concluido" => Ok(OrderStatus::Done),
            "cancelled" | "cancelado" => Ok(OrderStatus::Cancelled),
            _ => Err(ClosingError::UnknownStatus(s.to_string())),
        }
    }
}

/// Which order date drives date filters and date buckets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DateMode {
    /// Delivery date, falling back to entry date, then creation date
    #[default]
    Auto,
    Entry,
    Delivery,
}

impl FromStr for DateMode {
    type Err = ClosingError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(DateMode::Auto),
            "entry" | "entrada" => Ok(DateMode::Entry),
            "delivery" | "entrega" => Ok(DateMode::Delivery),
            _ => Err(ClosingError::UnknownDateMode(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderItem {
    #[serde(default, alias = "descricao", alias = "item_name")]
    pub description: Option<String>,
    #[serde(default)]
    pub designer: Option<String>,
    #[serde(default, alias = "vendedor")]
    pub seller: Option<String>,
    #[serde(default, alias = "tipo_producao")]
    pub production_type: Option<String>,
    #[serde(default)]
    pub subtotal: Option<MoneyInput>,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub unit_price: Option<MoneyInput>,
    #[serde(default, alias = "valor_unitario")]
    pub unit_value: Option<MoneyInput>,
}

impl OrderItem {
    /// Service value: stored subtotal, else quantity times unit price, else unit value
    pub fn service_amount(&self) -> Money {
        if let Some(subtotal) = &self.subtotal {
            return subtotal.to_money();
        }
        if let (Some(quantity), Some(price)) = (self.quantity, &self.unit_price) {
            return Money::from_units(quantity * price.to_money().to_units());
        }
        money_or_zero(&self.unit_value)
    }
}

/// An order as fetched from the backend, already filtered by the backend query
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Order {
    pub id: u64,
    #[serde(default, alias = "numero")]
    pub number: Option<String>,
    #[serde(default, alias = "cliente", alias = "customer_name")]
    pub client: Option<String>,
    #[serde(default, alias = "forma_envio")]
    pub delivery_method: Option<String>,
    #[serde(default, alias = "data_entrada")]
    pub entry_date: Option<String>,
    #[serde(default, alias = "data_entrega")]
    pub delivery_date: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default, alias = "valor_frete")]
    pub freight: Option<MoneyInput>,
    #[serde(default)]
    pub total_value: Option<MoneyInput>,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

/// Load a JSON array of orders
pub fn load_orders(path: &Path) -> Result<Vec<Order>> {
    if !path.exists() {
        return Err(ClosingError::OrdersNotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| ClosingError::OrdersParse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// A normalized line item with every grouping dimension resolved
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub id: LeafId,
    pub order_id: u64,
    pub ticket: String,
    pub client: String,
    pub designer: String,
    pub seller: String,
    pub production_type: String,
    pub delivery_method: String,
    pub status: OrderStatus,
    pub entry_date: Option<NaiveDate>,
    pub delivery_date: Option<NaiveDate>,
    pub created_date: Option<NaiveDate>,
    pub description: String,
    pub freight: Money,
    pub service: Money,
}

impl LineItem {
    pub fn reference_date(&self, mode: DateMode) -> Option<NaiveDate> {
        match mode {
            DateMode::Entry => self.entry_date,
            DateMode::Delivery => self.delivery_date,
            DateMode::Auto => self
                .delivery_date
                .or(self.entry_date)
                .or(self.created_date),
        }
    }

    /// Value this item takes for a grouping dimension; never empty
    pub fn dimension_value(&self, dimension: Dimension, mode: DateMode) -> String {
        match dimension {
            Dimension::Designer => self.designer.clone(),
            Dimension::Client => self.client.clone(),
            Dimension::Seller => self.seller.clone(),
            Dimension::ProductionType => self.production_type.clone(),
            Dimension::Delivery => self.delivery_method.clone(),
            Dimension::Date => date_label(self.reference_date(mode)),
            Dimension::EntryDate => date_label(self.entry_date),
            Dimension::DeliveryDate => date_label(self.delivery_date),
        }
    }

    pub fn to_row(&self) -> ReportRow {
        ReportRow {
            id: self.id.clone(),
            ticket: self.ticket.clone(),
            description: self.description.clone(),
            order_id: self.order_id,
            freight: self.freight,
            service: self.service,
        }
    }
}

pub fn date_label(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format(DATE_LABEL_FORMAT).to_string())
        .unwrap_or_else(|| NO_DATE.to_string())
}

/// Lenient date parsing for backend values: `YYYY-MM-DD`, a date-time starting with it,
/// or `DD/MM/YYYY`.
pub fn parse_order_date(value: Option<&str>) -> Option<NaiveDate> {
    let text = value?.trim();
    let head = text.get(..10).unwrap_or(text);
    NaiveDate::parse_from_str(head, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(head, DATE_LABEL_FORMAT))
        .ok()
}

fn safe_label(value: Option<&str>, fallback: &str) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => fallback.to_string(),
    }
}

/// Flatten orders into line items, distributing freight according to `mode`
pub fn normalize_orders(orders: &[Order], mode: DistributionMode) -> Vec<LineItem> {
    orders
        .iter()
        .flat_map(|order| normalize_order(order, mode))
        .collect()
}

fn normalize_order(order: &Order, mode: DistributionMode) -> Vec<LineItem> {
    let ticket = safe_label(order.number.as_deref(), &order.id.to_string());
    let client = safe_label(order.client.as_deref(), NO_CLIENT);
    let delivery_method = safe_label(order.delivery_method.as_deref(), NO_DELIVERY);
    let entry_date = parse_order_date(order.entry_date.as_deref());
    let delivery_date = parse_order_date(order.delivery_date.as_deref());
    let created_date = parse_order_date(order.created_at.as_deref());
    let order_freight = money_or_zero(&order.freight);

    let base = LineItem {
        id: LeafId::row(order.id, 0),
        order_id: order.id,
        ticket,
        client,
        designer: NO_DESIGNER.to_string(),
        seller: NO_SELLER.to_string(),
        production_type: NO_TYPE.to_string(),
        delivery_method,
        status: order.status,
        entry_date,
        delivery_date,
        created_date,
        description: EMPTY_ORDER.to_string(),
        freight: order_freight,
        service: Money::ZERO,
    };

    if order.items.is_empty() {
        return vec![LineItem {
            service: money_or_zero(&order.total_value) - order_freight,
            ..base
        }];
    }

    let freight_shares = match mode {
        DistributionMode::PerOrder => vec![order_freight; order.items.len()],
        DistributionMode::Proportional => order_freight.split(order.items.len()),
    };

    order
        .items
        .iter()
        .zip(freight_shares)
        .enumerate()
        .map(|(index, (item, freight))| LineItem {
            id: LeafId::row(order.id, index),
            designer: safe_label(item.designer.as_deref(), NO_DESIGNER),
            seller: safe_label(item.seller.as_deref(), NO_SELLER),
            production_type: safe_label(item.production_type.as_deref(), NO_TYPE),
            description: safe_label(item.description.as_deref(), NO_DESCRIPTION),
            freight,
            service: item.service_amount(),
            ..base.clone()
        })
        .collect()
}
