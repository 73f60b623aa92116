//! HTML report output

use serde_json::Value;

use super::ReportRenderer;
use crate::error::ReportRenderingError;

pub struct HtmlRenderer;

fn badge_color(label: &str) -> &'static str {
    match label {
        "critical" => "#721c24",
        "high" => "#dc3545",
        "medium" => "#ffc107",
        "low" => "#17a2b8",
        _ => "#28a745",
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn render_finding(finding: &Value) -> String {
    let coordinate = finding.get("dependency").and_then(Value::as_str).unwrap_or("?");
    let verdict = finding.get("verdict").and_then(Value::as_str).unwrap_or("none");

    let mut details = String::new();
    for advisory in finding.get("advisories").and_then(Value::as_array).into_iter().flatten() {
        let id = advisory.get("identifier").and_then(Value::as_str).unwrap_or("?");
        let summary = advisory.get("summary").and_then(Value::as_str).unwrap_or("");
        details.push_str(&format!(
            r#"<li><code>{}</code> {}</li>"#,
            escape(id),
            escape(summary)
        ));
    }
    for signal in finding.get("signals").and_then(Value::as_array).into_iter().flatten() {
        let category = signal.get("category").and_then(Value::as_str).unwrap_or("?");
        let message = signal.get("message").and_then(Value::as_str).unwrap_or("");
        details.push_str(&format!(
            r#"<li><span class="category">{}</span> {}</li>"#,
            escape(category),
            escape(message)
        ));
    }

    format!(
        r#"<div class="finding">
            <div class="finding-header">
                <span class="badge" style="background:{}">{}</span>
                <span class="coordinate">{}</span>
            </div>
            <ul class="finding-details">{}</ul>
        </div>"#,
        badge_color(verdict),
        verdict.to_uppercase(),
        escape(coordinate),
        details,
    )
}

impl ReportRenderer for HtmlRenderer {
    fn render(&self, report: &Value) -> Result<String, ReportRenderingError> {
        let summary = report.get("summary").cloned().unwrap_or_default();
        let path = summary.get("path").and_then(Value::as_str).unwrap_or("?");
        let highest = summary.get("highest_severity").and_then(Value::as_str).unwrap_or("none");
        let count = summary.get("dependency_count").and_then(Value::as_u64).unwrap_or(0);
        let managers: Vec<String> = summary
            .get("managers")
            .and_then(Value::as_array)
            .map(|a| a.iter().filter_map(|v| v.as_str()).map(str::to_string).collect())
            .unwrap_or_default();

        let mut findings_html = String::new();
        if let Some(findings) = report.get("findings").and_then(Value::as_array) {
            let mut sorted: Vec<&Value> = findings
                .iter()
                .filter(|f| f.get("verdict").and_then(Value::as_str) != Some("none"))
                .collect();
            sorted.sort_by_key(|f| f.get("dependency").and_then(Value::as_str).unwrap_or("").to_string());
            for finding in sorted {
                findings_html.push_str(&render_finding(finding));
            }
        }
        if findings_html.is_empty() {
            findings_html = r#"<p class="empty">No findings above LOW.</p>"#.to_string();
        }

        Ok(format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>deptrust report</title>
<style>
body {{ font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", sans-serif; margin: 2rem; color: #212529; }}
.header {{ border-bottom: 1px solid #dee2e6; padding-bottom: 1rem; margin-bottom: 1.5rem; }}
.badge {{ color: white; border-radius: 4px; padding: 0.15rem 0.5rem; font-size: 0.8rem; font-weight: bold; margin-right: 0.5rem; }}
.finding {{ border: 1px solid #dee2e6; border-radius: 6px; padding: 0.75rem 1rem; margin-bottom: 0.75rem; }}
.finding-header {{ display: flex; align-items: center; margin-bottom: 0.5rem; }}
.coordinate {{ font-family: monospace; }}
.finding-details {{ margin: 0; padding-left: 1.25rem; color: #495057; }}
.category {{ font-weight: 600; }}
.empty {{ color: #28a745; }}
</style>
</head>
<body>
<div class="header">
<h1>deptrust report</h1>
<p>Project: <code>{path}</code></p>
<p>Managers: {managers}</p>
<p>Dependencies scanned: {count} · Highest severity: <span class="badge" style="background:{badge_color}">{highest_upper}</span></p>
</div>
<div class="findings">{findings_html}</div>
</body>
</html>
"#,
            path = escape(path),
            managers = escape(&managers.join(", ")),
            count = count,
            badge_color = badge_color(highest),
            highest_upper = highest.to_uppercase(),
            findings_html = findings_html,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_a_document_with_the_project_path_and_managers() {
        let report = serde_json::json!({
            "summary": {"path": "/tmp/project", "dependency_count": 2, "highest_severity": "medium", "managers": ["npm", "pypi"]},
            "findings": [],
            "stats": {},
            "signal_summary": {},
        });
        let rendered = HtmlRenderer.render(&report).unwrap();
        assert!(rendered.contains("/tmp/project"));
        assert!(rendered.contains("npm, pypi"));
        assert!(rendered.contains("No findings above LOW."));
    }

    #[test]
    fn escapes_finding_text_to_avoid_breaking_the_markup() {
        let report = serde_json::json!({
            "summary": {"path": ".", "dependency_count": 1, "highest_severity": "high", "managers": []},
            "findings": [{
                "dependency": "npm:<script>@1.0.0",
                "verdict": "high",
                "advisories": [],
                "signals": [],
            }],
            "stats": {},
            "signal_summary": {},
        });
        let rendered = HtmlRenderer.render(&report).unwrap();
        assert!(rendered.contains("&lt;script&gt;"));
        assert!(!rendered.contains("<script>@"));
    }
}
