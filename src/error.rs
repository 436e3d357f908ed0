use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClosingError {
    #[error("Config directory not found at {0}. Run 'closings init' to create it.")]
    ConfigNotFound(PathBuf),

    #[error("Config file not found: {0}")]
    ConfigFileNotFound(PathBuf),

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config directory already exists at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("Orders file not found: {0}")]
    OrdersNotFound(PathBuf),

    #[error("Failed to parse orders file {path}: {source}")]
    OrdersParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid date '{0}'. Expected YYYY-MM-DD.")]
    InvalidDate(String),

    #[error("Invalid period: start date {start} is after end date {end}")]
    InvalidPeriod { start: String, end: String },

    #[error("Unknown report type '{0}'. Run 'closings types' to see available types.")]
    UnknownReportType(String),

    #[error("Unknown distribution mode '{0}'. Use 'per-order' or 'proportional'.")]
    UnknownDistribution(String),

    #[error("Unknown date mode '{0}'. Use 'auto', 'entry' or 'delivery'.")]
    UnknownDateMode(String),

    #[error("Unknown order status '{0}'. Use 'pending', 'in-progress', 'done' or 'cancelled'.")]
    UnknownStatus(String),

    #[error("Unknown sort field '{0}'. Use 'ticket', 'description', 'freight' or 'service'.")]
    UnknownSortField(String),

    #[error("Failed to write CSV export: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to serialize layout: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ClosingError>;
