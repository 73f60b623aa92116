//! Scan command - run the full pipeline over a project directory

use std::path::PathBuf;

use colored::Colorize;
use tracing::warn;

use super::{render_and_emit, ScanArgs};
use crate::cli::exit_codes;
use crate::config::Config;
use crate::error::{DeptrustError, ScanError};
use crate::orchestrator::ScanOrchestrator;
use crate::sbom;

pub async fn execute(args: ScanArgs, directory: PathBuf, config_path: Option<PathBuf>) -> Result<i32, DeptrustError> {
    let config = Config::load(config_path.as_deref())?;
    let cache_dir = match &args.cache_dir {
        Some(dir) => dir.clone(),
        None => crate::cache::resolve_cache_dir()?,
    };

    let orchestrator = ScanOrchestrator::new(config, &cache_dir)?;
    if args.clear_cache || args.no_cache {
        orchestrator.clear_caches();
    }

    let report = match orchestrator.scan(&directory, args.managers.as_deref()).await {
        Ok(report) => report,
        Err(DeptrustError::Scan(ScanError::ManifestNotFound { path })) => {
            warn!(path, "no scanner discovered any dependency under this directory");
            eprintln!(
                "{} no supported manifest found under {}",
                "warning:".yellow().bold(),
                path
            );
            return Ok(exit_codes::NO_MANIFESTS);
        }
        Err(other) => return Err(other),
    };

    if let Some(sbom_path) = &args.sbom {
        sbom::write_sbom(&report, sbom_path)?;
        println!("{} SBOM written to: {}", "info:".cyan().bold(), sbom_path.display());
    }

    let exit_code = report.exit_code();
    render_and_emit(args.format, args.output.as_deref(), &report.to_json())?;
    Ok(exit_code)
}
