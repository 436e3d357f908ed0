mod builder;
mod model;
mod orders;
mod prune;
mod selection;
mod sort;
mod totals;

pub use builder::{build, generate_report, parse_request_date, ReportFilters, ReportRequest};
pub use model::{
    Dimension, DistributionMode, GroupBody, LeafId, Money, ReportGroup, ReportPath,
    ReportResponse, ReportRow, ReportShape, ReportTotals, ReportType,
};
pub use orders::{
    load_orders, normalize_orders, DateMode, LineItem, MoneyInput, Order, OrderItem, OrderStatus,
};
pub use prune::{prune, PrunedTree};
pub use selection::{leaf_ids, recompute, Recomputation, SelectionSet};
pub use sort::{compare_tickets, locale_compare, sort_rows, SortDirection, SortField, SortState};
pub use totals::aggregate;
