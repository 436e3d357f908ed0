mod csv;
mod format;
mod layout;

pub use self::csv::{to_csv, write_csv, GRAND_TOTAL_LABEL};
pub use format::MoneyFormat;
pub use layout::{
    fit_text, layout, layout_with, row_height, wrap_text, ColumnBox, ColumnLayout,
    DocumentLayout, DrawOp, LayoutWarning, MonospaceMeasure, PageGeometry, PageLayout,
    TextMeasure, ELLIPSIS,
};

use crate::error::{ClosingError, Result};

/// Pretty JSON of a document layout, the hand-off format for renderers
pub fn layout_json(document: &DocumentLayout) -> Result<String> {
    serde_json::to_string_pretty(document).map_err(ClosingError::Serialize)
}
