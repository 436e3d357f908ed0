pub mod config;
pub mod error;
pub mod export;
pub mod report;

pub use config::{Company, Config, ReportSettings};
pub use error::{ClosingError, Result};
pub use export::{layout, to_csv, DocumentLayout, MoneyFormat, PageGeometry};
pub use report::{
    generate_report, leaf_ids, load_orders, prune, recompute, DistributionMode, LeafId, Order,
    ReportRequest, ReportResponse, ReportType, SelectionSet,
};
