//! Diagnostics command - print resolved configuration and cache state

use std::path::PathBuf;

use colored::Colorize;

use super::DiagnosticsArgs;
use crate::config::Config;
use crate::error::DeptrustError;

pub async fn execute(_args: DiagnosticsArgs, config_path: Option<PathBuf>) -> Result<i32, DeptrustError> {
    let config = Config::load(config_path.as_deref())?;
    let cache_dir = crate::cache::resolve_cache_dir()?;

    println!("{}", "deptrust diagnostics".cyan().bold());
    println!("  {} {}", "cache directory:".dimmed(), cache_dir.display());
    println!(
        "  {} {} ({})",
        "http timeout:".dimmed(),
        config.http_timeout_secs,
        format!("{} retries", config.http_retries).dimmed()
    );
    println!(
        "  {} batch={} concurrency={} cache_size={} disabled={}",
        "osv:".dimmed(),
        config.osv_batch_size,
        config.osv_max_concurrency,
        config.osv_cache_size,
        config.disable_osv
    );
    println!(
        "  {} concurrency={} token_configured={} disabled={}",
        "github advisories:".dimmed(),
        config.github_max_concurrency,
        config.github_token.is_some(),
        config.disable_github_advisories
    );
    println!("  {} {}", "go module concurrency:".dimmed(), config.gomod_concurrency);
    println!("  {} {}", "policy analysis concurrency:".dimmed(), config.policy_concurrency);
    println!(
        "  {} abandonment_days={} churn_high={} churn_medium={} low_maturity_min={} typosquat_max_distance={}",
        "policy thresholds:".dimmed(),
        config.policy.abandonment_threshold_days,
        config.policy.churn_high,
        config.policy.churn_medium,
        config.policy.low_maturity_threshold,
        config.policy.typosquat_max_distance
    );

    Ok(crate::cli::exit_codes::SUCCESS)
}
