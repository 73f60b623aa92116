//! Report command - re-render a previously saved JSON report

use colored::Colorize;

use super::{render_and_emit, ReportArgs};
use crate::cli::exit_codes;
use crate::error::DeptrustError;
use crate::models::exit_code_for_severity_label;

pub async fn execute(args: ReportArgs) -> Result<i32, DeptrustError> {
    let contents = match std::fs::read_to_string(&args.input) {
        Ok(contents) => contents,
        Err(e) => {
            eprintln!(
                "{} could not read {}: {}",
                "error:".red().bold(),
                args.input.display(),
                e
            );
            return Ok(exit_codes::REPORT_READ_ERROR);
        }
    };

    let report: serde_json::Value = match serde_json::from_str(&contents) {
        Ok(value) => value,
        Err(e) => {
            eprintln!(
                "{} could not parse {}: {}",
                "error:".red().bold(),
                args.input.display(),
                e
            );
            return Ok(exit_codes::REPORT_READ_ERROR);
        }
    };

    let highest = report
        .get("summary")
        .and_then(|s| s.get("highest_severity"))
        .and_then(|v| v.as_str())
        .unwrap_or("none");
    let exit_code = exit_code_for_severity_label(highest);

    render_and_emit(args.format, args.output.as_deref(), &report)?;
    Ok(exit_code)
}
