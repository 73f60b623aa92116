//! Output formatting module for the CLI
//!
//! Every renderer operates on the saved-report JSON shape
//! (`{summary, findings, stats, signal_summary}`, produced by
//! [`crate::models::Report::to_json`]) rather than on the `Report` struct
//! directly, so `deptrust report` can re-render a file from disk without
//! reconstructing the original findings.

mod html;
mod json;
mod table;

pub use html::HtmlRenderer;
pub use json::JsonRenderer;
pub use table::TableRenderer;

use serde_json::Value;

use crate::error::ReportRenderingError;

/// Renders a saved-report JSON document into an output string.
pub trait ReportRenderer {
    fn render(&self, report: &Value) -> Result<String, ReportRenderingError>;
}
