//! # CLI Module
//!
//! Defines the command-line interface for `deptrust` using `clap`.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `scan` | Scan a project directory and report trust findings |
//! | `pre-upgrade` | Check a single candidate package before adding or upgrading it |
//! | `report` | Re-render a previously saved JSON report |
//! | `diagnostics` | Print resolved configuration and cache state |
//! | `list-managers` | List the package managers this crate can scan |
//!
//! ## Submodules
//!
//! - [`commands`] - Command implementations
//! - [`exit_codes`] - Standardized exit codes
//! - [`output`] - Report renderers (table, JSON, HTML)
//!
//! ## Global Options
//!
//! - `-v, --verbose` - Increase verbosity level (use multiple times: -v, -vv)
//! - `--config <FILE>` - Path to an optional `deptrust.toml` threshold override
//! - `-C, --directory <DIR>` - Project directory (defaults to the current directory)
//!
//! ## Examples
//!
//! ```bash
//! # Scan the current directory and print a table
//! deptrust scan
//!
//! # Scan and write a JSON report plus an SBOM
//! deptrust scan --format json --output report.json --sbom sbom.json
//!
//! # Check one candidate package before upgrading it
//! deptrust pre-upgrade npm left-pad 1.0.0
//!
//! # Re-render a saved report as HTML
//! deptrust report --input report.json --format html --output report.html
//! ```

pub mod commands;
pub mod exit_codes;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::{DiagnosticsArgs, ListManagersArgs, PreUpgradeArgs, ReportArgs, ScanArgs};

/// deptrust - a concurrent dependency trust scanner
#[derive(Parser, Debug)]
#[command(name = "deptrust")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to an optional deptrust.toml threshold override file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Project directory to scan (defaults to the current directory)
    #[arg(short = 'C', long, global = true, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan a project directory and report trust findings
    Scan(ScanArgs),

    /// Check a single candidate package before adding or upgrading it
    PreUpgrade(PreUpgradeArgs),

    /// Re-render a previously saved JSON report
    Report(ReportArgs),

    /// Print resolved configuration and cache diagnostics
    Diagnostics(DiagnosticsArgs),

    /// List the package managers this crate can scan
    ListManagers(ListManagersArgs),
}
