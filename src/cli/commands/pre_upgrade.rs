//! Pre-upgrade command - trust-check one candidate package before it lands
//! in a manifest, without scanning a project directory.

use std::path::PathBuf;

use super::{render_and_emit, PreUpgradeArgs};
use crate::advisory::AdvisoryAggregator;
use crate::config::Config;
use crate::error::{DeptrustError, ScanError};
use crate::metadata::MetadataResolver;
use crate::models::{Dependency, Ecosystem, Report, ReleaseMetadata};
use crate::policy::TrustPolicyEngine;

pub async fn execute(args: PreUpgradeArgs, config_path: Option<PathBuf>) -> Result<i32, DeptrustError> {
    let ecosystem = Ecosystem::parse(&args.ecosystem)
        .ok_or_else(|| DeptrustError::Scan(ScanError::UnknownManagers(vec![args.ecosystem.clone()])))?;

    let config = Config::load(config_path.as_deref())?;
    let cache_dir = match &args.cache_dir {
        Some(dir) => dir.clone(),
        None => crate::cache::resolve_cache_dir()?,
    };

    let advisories = AdvisoryAggregator::new(&config);
    let metadata = MetadataResolver::new(&config, &cache_dir)?;
    let policy = TrustPolicyEngine::new(config.policy.clone())?;

    let dependency = Dependency::new(ecosystem, &args.name, &args.version, true, PathBuf::from("pre-upgrade"));

    let advisory_map = advisories.fetch_advisories(std::slice::from_ref(&dependency)).await?;
    let dependency_advisories = advisory_map.get(&dependency.coordinate()).cloned().unwrap_or_default();
    let release_metadata = metadata
        .fetch(&dependency)
        .await
        .unwrap_or_else(|_| ReleaseMetadata::empty(dependency.normalized_ecosystem()));

    let finding = policy.analyze(&dependency, &dependency_advisories, &release_metadata);

    let report = Report {
        path: PathBuf::from(dependency.coordinate()),
        managers: vec![ecosystem.as_str().to_string()],
        findings: vec![finding],
        generated_at: chrono::Utc::now(),
        stats: std::collections::HashMap::new(),
    };

    let exit_code = report.exit_code();
    render_and_emit(args.format, args.output.as_deref(), &report.to_json())?;
    Ok(exit_code)
}
