//! Terminal output formatting with colors

use colored::Colorize;
use serde_json::Value;

use super::ReportRenderer;
use crate::error::ReportRenderingError;

pub struct TableRenderer;

fn severity_badge(label: &str) -> colored::ColoredString {
    match label {
        "critical" => "CRITICAL".red().bold(),
        "high" => "HIGH".red(),
        "medium" => "MEDIUM".yellow(),
        "low" => "LOW".blue(),
        _ => "NONE".dimmed(),
    }
}

impl TableRenderer {
    fn format_header(&self, summary: &Value) -> String {
        let path = summary.get("path").and_then(Value::as_str).unwrap_or("?");
        let managers: Vec<String> = summary
            .get("managers")
            .and_then(Value::as_array)
            .map(|a| a.iter().filter_map(|v| v.as_str()).map(str::to_string).collect())
            .unwrap_or_default();

        format!(
            "\n{} v{}\n\n{} {}\n{} {}\n",
            "deptrust".cyan().bold(),
            env!("CARGO_PKG_VERSION"),
            "Project:".dimmed(),
            path.white().bold(),
            "Managers:".dimmed(),
            managers.join(", ").yellow(),
        )
    }

    fn format_findings(&self, findings: &[Value]) -> String {
        let mut output = String::new();
        output.push_str(&format!("\n{}\n{}\n\n", "─".repeat(60).dimmed(), "FINDINGS".bold()));

        let mut sorted: Vec<&Value> = findings.iter().collect();
        sorted.sort_by_key(|f| f.get("dependency").and_then(Value::as_str).unwrap_or("").to_string());

        let mut any = false;
        for finding in sorted {
            let verdict = finding.get("verdict").and_then(Value::as_str).unwrap_or("none");
            if verdict == "none" {
                continue;
            }
            any = true;
            output.push_str(&self.format_finding(finding, verdict));
        }
        if !any {
            output.push_str(&format!("  {}\n", "No findings above LOW.".green()));
        }
        output
    }

    fn format_finding(&self, finding: &Value, verdict: &str) -> String {
        let coordinate = finding.get("dependency").and_then(Value::as_str).unwrap_or("?");
        let mut out = format!("  {} [{}] {}\n", "•".dimmed(), severity_badge(verdict), coordinate.cyan());

        for advisory in finding.get("advisories").and_then(Value::as_array).into_iter().flatten() {
            let id = advisory.get("identifier").and_then(Value::as_str).unwrap_or("?");
            let summary = advisory.get("summary").and_then(Value::as_str).unwrap_or("");
            out.push_str(&format!("    {} {} {}\n", "└─".dimmed(), id.dimmed(), summary));
        }
        for signal in finding.get("signals").and_then(Value::as_array).into_iter().flatten() {
            let category = signal.get("category").and_then(Value::as_str).unwrap_or("?");
            let message = signal.get("message").and_then(Value::as_str).unwrap_or("");
            out.push_str(&format!("    {} {} {}\n", "└─".dimmed(), category.dimmed(), message));
        }
        out
    }

    fn format_summary(&self, summary: &Value, signal_summary: &Value) -> String {
        let count = summary.get("dependency_count").and_then(Value::as_u64).unwrap_or(0);
        let highest = summary.get("highest_severity").and_then(Value::as_str).unwrap_or("none");

        let mut out = format!("\n{}\n{}\n\n", "─".repeat(60).dimmed(), "SUMMARY".bold());
        out.push_str(&format!(
            "Dependencies: {} │ Highest severity: {}\n",
            count.to_string().bold(),
            severity_badge(highest)
        ));

        if let Some(categories) = signal_summary.get("category_counts").and_then(Value::as_object) {
            for (category, value) in categories {
                let n = value.as_u64().unwrap_or(0);
                if n > 0 {
                    out.push_str(&format!("  {} {}: {}\n", "•".dimmed(), category, n));
                }
            }
        }
        out
    }
}

impl ReportRenderer for TableRenderer {
    fn render(&self, report: &Value) -> Result<String, ReportRenderingError> {
        let summary = report.get("summary").cloned().unwrap_or_default();
        let findings: Vec<Value> = report
            .get("findings")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let signal_summary = report.get("signal_summary").cloned().unwrap_or_default();

        let mut output = String::new();
        output.push_str(&self.format_header(&summary));
        output.push_str(&self.format_findings(&findings));
        output.push_str(&self.format_summary(&summary, &signal_summary));
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_a_header_and_summary_for_an_empty_report() {
        let report = serde_json::json!({
            "summary": {"path": "/tmp/project", "dependency_count": 0, "highest_severity": "none", "managers": ["npm"]},
            "findings": [],
            "stats": {},
            "signal_summary": {"category_counts": {}, "category_severity": {}, "severity_totals": {}},
        });
        let rendered = TableRenderer.render(&report).unwrap();
        assert!(rendered.contains("deptrust"));
        assert!(rendered.contains("No findings above LOW."));
    }

    #[test]
    fn renders_a_finding_line_for_non_none_verdicts() {
        let report = serde_json::json!({
            "summary": {"path": "/tmp/project", "dependency_count": 1, "highest_severity": "high", "managers": ["npm"]},
            "findings": [{
                "dependency": "npm:left-pad@1.0.0",
                "verdict": "high",
                "advisories": [],
                "signals": [{"category": "abandonment", "severity": "high", "message": "no release in 900 days"}],
            }],
            "stats": {},
            "signal_summary": {"category_counts": {"abandonment": 1}, "category_severity": {}, "severity_totals": {}},
        });
        let rendered = TableRenderer.render(&report).unwrap();
        assert!(rendered.contains("npm:left-pad@1.0.0"));
        assert!(rendered.contains("no release in 900 days"));
    }
}
