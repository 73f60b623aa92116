//! # Scan Orchestrator
//!
//! Drives a single scan end to end: selects scanners, discovers and
//! deduplicates dependencies, fetches advisories, runs policy analysis under
//! a concurrency bound, and assembles the final [`Report`].

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::info;

use crate::advisory::AdvisoryAggregator;
use crate::config::Config;
use crate::error::{DeptrustError, ScanError};
use crate::metadata::MetadataResolver;
use crate::models::{Dependency, PackageFinding, Report};
use crate::policy::TrustPolicyEngine;
use crate::scanners::registry::get_scanners;
use crate::utils::graph::Graph;

pub struct ScanOrchestrator {
    config: Config,
    advisories: AdvisoryAggregator,
    metadata: MetadataResolver,
    policy: TrustPolicyEngine,
}

impl ScanOrchestrator {
    pub fn new(config: Config, cache_dir: &Path) -> Result<Self, DeptrustError> {
        let advisories = AdvisoryAggregator::new(&config);
        let metadata = MetadataResolver::new(&config, cache_dir)?;
        let policy = TrustPolicyEngine::new(config.policy.clone())?;
        Ok(Self {
            config,
            advisories,
            metadata,
            policy,
        })
    }

    /// Drop every cached metadata and advisory entry. Used by the CLI's
    /// `--clear-cache`/`--no-cache` flags before a scan.
    pub fn clear_caches(&self) {
        self.metadata.clear_cache(true);
        self.advisories.clear_cache();
    }

    pub async fn scan(&self, root: &Path, managers: Option<&[String]>) -> Result<Report, DeptrustError> {
        let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
        let scanners = get_scanners(managers)?;

        let mut discovered = Vec::new();
        let mut used_managers = Vec::new();
        let mut relationships: Vec<(String, String)> = Vec::new();
        for scanner in &scanners {
            if managers.is_none() && !scanner.matches(&root) {
                continue;
            }
            let packages = scanner.scan(&root);
            if !packages.is_empty() {
                info!(manager = scanner.manager(), count = packages.len(), "scanner discovered dependencies");
                used_managers.push(scanner.manager().to_string());
                relationships.extend(scanner.relationships(&root));
                discovered.extend(packages);
            }
        }

        if discovered.is_empty() {
            return Err(ScanError::ManifestNotFound {
                path: root.display().to_string(),
            }
            .into());
        }

        let dependencies = dedupe(discovered);

        let advisory_map = self.advisories.fetch_advisories(&dependencies).await?;

        let limit = self.config.policy_concurrency.max(1);
        let semaphore = Arc::new(Semaphore::new(limit));

        let analyses = dependencies.iter().map(|dep| {
            let semaphore = semaphore.clone();
            let advisories = advisory_map.get(&dep.coordinate()).cloned().unwrap_or_default();
            async move {
                let _permit = semaphore.acquire().await.expect("semaphore is never closed");
                let metadata = self
                    .metadata
                    .fetch(dep)
                    .await
                    .unwrap_or_else(|_| crate::models::ReleaseMetadata::empty(dep.normalized_ecosystem()));
                self.policy.analyze(dep, &advisories, &metadata)
            }
        });

        let mut findings: Vec<PackageFinding> = futures::future::join_all(analyses).await;
        findings.sort_by(|a, b| a.dependency.coordinate().cmp(&b.dependency.coordinate()));

        let mut graph = Graph::new();
        for finding in &findings {
            graph.add_node(finding.dependency.coordinate());
        }
        for (src, dst) in &relationships {
            graph.add_edge(src, dst);
        }

        used_managers.sort();
        used_managers.dedup();

        let direct_count = findings.iter().filter(|f| f.dependency.direct).count();
        let mut per_ecosystem: HashMap<String, usize> = HashMap::new();
        for finding in &findings {
            *per_ecosystem.entry(finding.dependency.normalized_ecosystem()).or_insert(0) += 1;
        }

        let mut stats = HashMap::new();
        stats.insert("dependency_count".to_string(), serde_json::json!(findings.len()));
        stats.insert("direct_count".to_string(), serde_json::json!(direct_count));
        stats.insert("indirect_count".to_string(), serde_json::json!(findings.len() - direct_count));
        stats.insert("graph_nodes".to_string(), serde_json::json!(graph.node_count()));
        stats.insert("graph_edges".to_string(), serde_json::json!(graph.edge_count()));
        stats.insert("per_ecosystem_counts".to_string(), serde_json::json!(per_ecosystem));

        Ok(Report {
            path: root,
            managers: used_managers,
            findings,
            generated_at: chrono::Utc::now(),
            stats,
        })
    }
}

/// Fold discovered dependencies into one entry per coordinate using
/// [`Dependency::merge`], preserving first-seen order.
fn dedupe(discovered: Vec<Dependency>) -> Vec<Dependency> {
    let mut order: Vec<String> = Vec::new();
    let mut by_coordinate: HashMap<String, Dependency> = HashMap::new();
    for dep in discovered {
        let coordinate = dep.coordinate();
        match by_coordinate.get(&coordinate) {
            Some(existing) => {
                let merged = Dependency::merge(existing, &dep);
                by_coordinate.insert(coordinate, merged);
            }
            None => {
                order.push(coordinate.clone());
                by_coordinate.insert(coordinate, dep);
            }
        }
    }
    order.into_iter().filter_map(|c| by_coordinate.remove(&c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::models::Ecosystem;

    #[test]
    fn dedupe_merges_same_coordinate_entries() {
        let a = Dependency::new(Ecosystem::Npm, "left-pad", "1.0.0", true, PathBuf::from("package.json"));
        let b = Dependency::new(Ecosystem::Npm, "left-pad", "1.0.0", false, PathBuf::from("package-lock.json"));
        let merged = dedupe(vec![a, b]);
        assert_eq!(merged.len(), 1);
        assert!(merged[0].direct);
    }

    #[test]
    fn dedupe_preserves_first_seen_order() {
        let a = Dependency::new(Ecosystem::Npm, "zeta", "1.0.0", true, PathBuf::from("package.json"));
        let b = Dependency::new(Ecosystem::Npm, "alpha", "1.0.0", true, PathBuf::from("package.json"));
        let merged = dedupe(vec![a, b]);
        assert_eq!(merged[0].name, "zeta");
        assert_eq!(merged[1].name, "alpha");
    }
}
