//! JSON output formatting

use serde_json::Value;

use super::ReportRenderer;
use crate::error::ReportRenderingError;

pub struct JsonRenderer;

impl ReportRenderer for JsonRenderer {
    fn render(&self, report: &Value) -> Result<String, ReportRenderingError> {
        serde_json::to_string_pretty(report).map_err(|e| ReportRenderingError::TemplateError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_pretty_printed_json() {
        let report = serde_json::json!({"summary": {"dependency_count": 1}});
        let rendered = JsonRenderer.render(&report).unwrap();
        assert!(rendered.contains("\"dependency_count\": 1"));
    }
}
