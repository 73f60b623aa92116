//! deptrust - a concurrent dependency trust scanner
//!
//! This is the main entry point for the CLI application.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod advisory;
mod cache;
mod cli;
mod config;
mod error;
mod metadata;
mod models;
mod orchestrator;
mod policy;
mod scanners;
mod sbom;
mod utils;

use cli::{exit_codes, Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let directory = cli.directory.clone().unwrap_or_else(|| PathBuf::from("."));
    let config_path = cli.config.clone();

    let result = match cli.command {
        Commands::Scan(args) => cli::commands::scan::execute(args, directory, config_path).await,
        Commands::PreUpgrade(args) => cli::commands::pre_upgrade::execute(args, config_path).await,
        Commands::Report(args) => cli::commands::report::execute(args).await,
        Commands::Diagnostics(args) => cli::commands::diagnostics::execute(args, config_path).await,
        Commands::ListManagers(args) => cli::commands::list_managers::execute(args).await,
    };

    match result {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            eprintln!("{}", e.display_formatted());
            std::process::exit(exit_codes::HIGH_OR_USAGE_ERROR);
        }
    }
}

fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();
}
