//! CLI commands module

pub mod diagnostics;
pub mod list_managers;
pub mod pre_upgrade;
pub mod report;
pub mod scan;

use std::path::{Path, PathBuf};

use clap::Args;
use serde_json::Value;

use crate::error::{DeptrustError, ReportRenderingError};

use super::output::{HtmlRenderer, JsonRenderer, ReportRenderer as _, TableRenderer};

/// Output format shared by every command that renders a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Html,
}

/// Render the saved-report JSON shape (`{summary, findings, stats,
/// signal_summary}`, per [`crate::models::Report::to_json`]) in `format` and
/// write it to `output`, honoring the rule that `json`/`html` require an
/// explicit path (`-` streams to stdout).
pub fn render_and_emit(format: OutputFormat, output: Option<&Path>, report: &Value) -> Result<(), DeptrustError> {
    let rendered = match format {
        OutputFormat::Table => TableRenderer.render(report),
        OutputFormat::Json => JsonRenderer.render(report),
        OutputFormat::Html => HtmlRenderer.render(report),
    }?;

    match output {
        None if matches!(format, OutputFormat::Table) => {
            println!("{rendered}");
            Ok(())
        }
        None => Err(ReportRenderingError::TemplateError(format!(
            "{format:?} output requires --output (use - to stream to stdout)"
        ))
        .into()),
        Some(path) if path == Path::new("-") => {
            println!("{rendered}");
            Ok(())
        }
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::write(path, rendered)?;
            Ok(())
        }
    }
}

/// Arguments for the scan command
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Restrict the scan to these managers (comma-separated); defaults to
    /// every manager whose manifest is present under the target directory
    #[arg(long, value_delimiter = ',')]
    pub managers: Option<Vec<String>>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Output file (table defaults to stdout; json/html require this)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Also write a CycloneDX SBOM to this path
    #[arg(long, value_name = "FILE")]
    pub sbom: Option<PathBuf>,

    /// Bypass the metadata cache for this run
    #[arg(long)]
    pub no_cache: bool,

    /// Clear the metadata cache before scanning
    #[arg(long)]
    pub clear_cache: bool,

    /// Custom cache directory (defaults to the platform cache directory)
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,
}

/// Arguments for the pre-upgrade command
#[derive(Args, Debug)]
pub struct PreUpgradeArgs {
    /// Ecosystem of the candidate package (npm, pypi, maven, cargo, go, ...)
    pub ecosystem: String,

    /// Package name
    pub name: String,

    /// Candidate version
    pub version: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Output file (table defaults to stdout; json/html require this)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Custom cache directory (defaults to the platform cache directory)
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,
}

/// Arguments for the report command
#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Path to a previously saved JSON report
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Output file (table defaults to stdout; json/html require this)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Arguments for the diagnostics command
#[derive(Args, Debug)]
pub struct DiagnosticsArgs {}

/// Arguments for the list-managers command
#[derive(Args, Debug)]
pub struct ListManagersArgs {
    /// Print the manager list as a JSON array
    #[arg(long)]
    pub json: bool,
}
