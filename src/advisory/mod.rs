//! # Advisory Aggregator
//!
//! Combines a batched OSV-style vulnerability source with a per-package
//! GitHub-style GraphQL source, deduplicates and merges results per
//! dependency coordinate, and maintains an LRU cache of OSV lookups.

pub mod github;
pub mod osv;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use lru::LruCache;
use reqwest::StatusCode;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::AdvisoryError;
use crate::models::{Advisory, Dependency, Ecosystem, Severity};
use crate::utils::{chunked, retry_with_backoff};

use github::{github_ecosystem_label, severity_from_github_label, GraphqlEnvelope, GRAPHQL_QUERY};
use osv::{build_batch_query, severity_from_osv};

pub struct AdvisoryAggregator {
    client: reqwest::Client,
    config: AdvisoryConfig,
    osv_cache: Mutex<LruCache<String, Vec<Advisory>>>,
    osv_semaphore: Arc<Semaphore>,
    github_semaphore: Arc<Semaphore>,
}

struct AdvisoryConfig {
    batch_size: usize,
    retries: u32,
    disable_osv: bool,
    disable_github: bool,
    github_token: Option<String>,
    osv_endpoint: String,
    github_graphql_endpoint: String,
}

impl AdvisoryAggregator {
    pub fn new(config: &Config) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs_f64(config.http_timeout_secs))
            .build()
            .expect("reqwest client builder is infallible for this configuration");

        let capacity = std::num::NonZeroUsize::new(config.osv_cache_size.max(1))
            .expect("capacity is clamped to at least 1");

        Self {
            client,
            config: AdvisoryConfig {
                batch_size: config.osv_batch_size,
                retries: config.http_retries,
                disable_osv: config.disable_osv,
                disable_github: config.disable_github_advisories,
                github_token: config.github_token.clone(),
                osv_endpoint: config.osv_endpoint.clone(),
                github_graphql_endpoint: config.github_graphql_endpoint.clone(),
            },
            osv_cache: Mutex::new(LruCache::new(capacity)),
            osv_semaphore: Arc::new(Semaphore::new(config.osv_max_concurrency.max(1))),
            github_semaphore: Arc::new(Semaphore::new(config.github_max_concurrency.max(1))),
        }
    }

    /// Drop every cached OSV entry.
    pub fn clear_cache(&self) {
        self.osv_cache.lock().unwrap().clear();
    }

    /// Fetch advisories for every dependency, keyed by coordinate. Every
    /// input coordinate is guaranteed to appear as a key (possibly with an
    /// empty list).
    pub async fn fetch_advisories(
        &self,
        deps: &[Dependency],
    ) -> Result<HashMap<String, Vec<Advisory>>, AdvisoryError> {
        let mut result: HashMap<String, Vec<Advisory>> = HashMap::new();
        for dep in deps {
            result.insert(dep.coordinate(), Vec::new());
        }

        let osv_results = self.fetch_osv(deps).await?;
        for (coordinate, advisories) in osv_results {
            result.entry(coordinate).or_default().extend(advisories);
        }

        match self.fetch_github(deps).await {
            Ok(github_results) => {
                for (coordinate, advisories) in github_results {
                    result.entry(coordinate).or_default().extend(advisories);
                }
            }
            Err(AdvisoryError::InvalidToken) => {
                warn!("GitHub advisory source rejected the configured token; continuing with OSV results only");
            }
            Err(other) => return Err(other),
        }

        for advisories in result.values_mut() {
            *advisories = merge_advisories(std::mem::take(advisories));
        }

        Ok(result)
    }

    async fn fetch_osv(&self, deps: &[Dependency]) -> Result<HashMap<String, Vec<Advisory>>, AdvisoryError> {
        let mut result: HashMap<String, Vec<Advisory>> = HashMap::new();
        if self.config.disable_osv {
            return Ok(result);
        }

        let mut uncached: Vec<&Dependency> = Vec::new();
        {
            let mut cache = self.osv_cache.lock().unwrap();
            for dep in deps {
                let coordinate = dep.coordinate();
                if dep.ecosystem.osv_label().is_none() {
                    result.insert(coordinate, Vec::new());
                    continue;
                }
                if let Some(cached) = cache.get(&coordinate) {
                    result.insert(coordinate, cached.clone());
                } else {
                    uncached.push(dep);
                }
            }
        }

        if uncached.is_empty() {
            return Ok(result);
        }

        let chunks = chunked(&uncached, self.config.batch_size);
        let mut handles = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let permit = Arc::clone(&self.osv_semaphore)
                .acquire_owned()
                .await
                .expect("semaphore is never closed");
            let chunk_owned: Vec<Dependency> = chunk.iter().map(|d| (*d).clone()).collect();
            let client = self.client.clone();
            let retries = self.config.retries;
            let endpoint = self.config.osv_endpoint.clone();
            handles.push(tokio::spawn(async move {
                let _permit = permit;
                query_osv_chunk(&client, &endpoint, &chunk_owned, retries).await
            }));
        }

        for handle in handles {
            let chunk_result = handle
                .await
                .map_err(|e| AdvisoryError::ServiceError(format!("chunk task panicked: {e}")))??;
            for (coordinate, advisories) in chunk_result {
                result.insert(coordinate.clone(), advisories.clone());
                let mut cache = self.osv_cache.lock().unwrap();
                cache.put(coordinate, advisories);
            }
        }

        Ok(result)
    }

    async fn fetch_github(&self, deps: &[Dependency]) -> Result<HashMap<String, Vec<Advisory>>, AdvisoryError> {
        let mut result: HashMap<String, Vec<Advisory>> = HashMap::new();
        if self.config.disable_github {
            return Ok(result);
        }
        let Some(token) = self.config.github_token.clone() else {
            return Ok(result);
        };

        // Dedup across versions: one lookup per (ecosystem, upper(name)).
        let mut seen: HashMap<(String, String), Vec<&Dependency>> = HashMap::new();
        for dep in deps {
            if github_ecosystem_label(dep.ecosystem).is_none() {
                continue;
            }
            let key = (dep.ecosystem.as_str().to_string(), dep.name.to_uppercase());
            seen.entry(key).or_default().push(dep);
        }

        let mut handles = Vec::with_capacity(seen.len());
        for ((ecosystem, _upper_name), group) in seen {
            let permit = Arc::clone(&self.github_semaphore)
                .acquire_owned()
                .await
                .expect("semaphore is never closed");
            let client = self.client.clone();
            let token = token.clone();
            let name = group[0].name.clone();
            let coordinates: Vec<String> = group.iter().map(|d| d.coordinate()).collect();
            let ecosystem_label = github_ecosystem_label(Ecosystem::parse(&ecosystem).unwrap()).unwrap();
            let endpoint = self.config.github_graphql_endpoint.clone();
            handles.push(tokio::spawn(async move {
                let _permit = permit;
                let advisories = query_github_package(&client, &endpoint, &token, ecosystem_label, &name).await?;
                Ok::<(Vec<String>, Vec<Advisory>), AdvisoryError>((coordinates, advisories))
            }));
        }

        for handle in handles {
            let task_result = handle
                .await
                .map_err(|e| AdvisoryError::ServiceError(format!("chunk task panicked: {e}")))?;
            let (coordinates, advisories) = task_result?;
            for coordinate in coordinates {
                result.insert(coordinate, advisories.clone());
            }
        }

        Ok(result)
    }
}

async fn query_osv_chunk(
    client: &reqwest::Client,
    endpoint: &str,
    deps: &[Dependency],
    retries: u32,
) -> Result<HashMap<String, Vec<Advisory>>, AdvisoryError> {
    let refs: Vec<&Dependency> = deps.iter().collect();
    let body = build_batch_query(&refs);

    let response = retry_with_backoff(
        retries,
        Duration::from_millis(200),
        || {
            let client = client.clone();
            let body = &body;
            async move {
                let response = client.post(endpoint).json(body).send().await.map_err(|e| e.to_string())?;
                if response.status().is_server_error() {
                    return Err(format!("OSV returned {}", response.status()));
                }
                Ok(response)
            }
        },
        |_| true,
    )
    .await
    .map_err(|e| AdvisoryError::RetriesExhausted(e.to_string()))?;

    let status = response.status();
    if status.is_client_error() {
        debug!(%status, "OSV batch request returned a client error; treating chunk as empty");
        return Ok(deps.iter().map(|d| (d.coordinate(), Vec::new())).collect());
    }

    let parsed: osv::OsvBatchResponse = response
        .json()
        .await
        .map_err(|e| AdvisoryError::ServiceError(format!("failed to parse OSV response: {e}")))?;

    let mut out = HashMap::new();
    for (i, dep) in deps.iter().enumerate() {
        let vulns = parsed.results.get(i).map(|r| r.vulns.as_slice()).unwrap_or(&[]);
        let advisories = vulns
            .iter()
            .map(|v| Advisory {
                identifier: v.id.clone(),
                source: "osv".to_string(),
                severity: severity_from_osv(v),
                summary: v
                    .summary
                    .clone()
                    .filter(|s| !s.is_empty())
                    .or_else(|| v.details.clone())
                    .unwrap_or_default(),
                references: v.references.iter().filter_map(|r| r.url.clone()).collect(),
            })
            .collect();
        out.insert(dep.coordinate(), advisories);
    }
    Ok(out)
}

async fn query_github_package(
    client: &reqwest::Client,
    endpoint: &str,
    token: &str,
    ecosystem_label: &str,
    name: &str,
) -> Result<Vec<Advisory>, AdvisoryError> {
    let response = client
        .post(endpoint)
        .bearer_auth(token)
        .json(&serde_json::json!({
            "query": GRAPHQL_QUERY,
            "variables": { "ecosystem": ecosystem_label, "package": name },
        }))
        .send()
        .await
        .map_err(|e| AdvisoryError::ServiceError(e.to_string()))?;

    if response.status() == StatusCode::UNAUTHORIZED {
        return Err(AdvisoryError::InvalidToken);
    }
    if !response.status().is_success() {
        debug!(status = %response.status(), "GitHub advisory request failed; treating package as having no advisories");
        return Ok(Vec::new());
    }

    let envelope: GraphqlEnvelope = match response.json().await {
        Ok(v) => v,
        Err(_) => return Ok(Vec::new()),
    };

    let Some(data) = envelope.data else {
        return Ok(Vec::new());
    };

    Ok(data
        .security_vulnerabilities
        .nodes
        .into_iter()
        .map(|node| Advisory {
            identifier: node.advisory.identifier(),
            source: "github".to_string(),
            severity: severity_from_github_label(node.advisory.severity.as_deref()),
            summary: node.advisory.summary,
            references: node.advisory.permalink.into_iter().collect(),
        })
        .collect())
}

/// Group advisories by `(source, identifier)`, keep the highest severity per
/// group, union references in insertion order, then sort by
/// `(-rank, source, identifier)`.
fn merge_advisories(advisories: Vec<Advisory>) -> Vec<Advisory> {
    let mut groups: Vec<Advisory> = Vec::new();
    for advisory in advisories {
        if let Some(existing) = groups
            .iter_mut()
            .find(|a: &&mut Advisory| a.source == advisory.source && a.identifier == advisory.identifier)
        {
            let incoming_wins = advisory.severity > existing.severity;
            if incoming_wins {
                existing.severity = advisory.severity;
                if !advisory.summary.is_empty() {
                    existing.summary = advisory.summary.clone();
                }
            } else if existing.summary.is_empty() && !advisory.summary.is_empty() {
                existing.summary = advisory.summary.clone();
            }
            for reference in advisory.references {
                if !existing.references.contains(&reference) {
                    existing.references.push(reference);
                }
            }
        } else {
            groups.push(advisory);
        }
    }
    groups.sort_by(|a, b| {
        b.severity
            .rank()
            .cmp(&a.severity.rank())
            .then_with(|| a.source.cmp(&b.source))
            .then_with(|| a.identifier.cmp(&b.identifier))
    });
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn advisory(source: &str, id: &str, severity: Severity, summary: &str, refs: &[&str]) -> Advisory {
        Advisory {
            identifier: id.to_string(),
            source: source.to_string(),
            severity,
            summary: summary.to_string(),
            references: refs.iter().map(|r| r.to_string()).collect(),
        }
    }

    #[test]
    fn merge_keeps_higher_severity_and_unions_references() {
        let merged = merge_advisories(vec![
            advisory("osv", "GHSA-1", Severity::Low, "old", &["u1"]),
            advisory("osv", "GHSA-1", Severity::High, "new", &["u2", "u1"]),
        ]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].severity, Severity::High);
        assert_eq!(merged[0].summary, "new");
        assert_eq!(merged[0].references, vec!["u1", "u2"]);
    }

    #[test]
    fn merge_never_produces_lower_severity_than_either_input() {
        let merged = merge_advisories(vec![
            advisory("osv", "GHSA-1", Severity::High, "a", &[]),
            advisory("osv", "GHSA-1", Severity::Medium, "b", &[]),
        ]);
        assert_eq!(merged[0].severity, Severity::High);
    }

    #[test]
    fn merge_sorts_by_rank_then_source_then_identifier() {
        let merged = merge_advisories(vec![
            advisory("osv", "GHSA-2", Severity::Low, "", &[]),
            advisory("github", "GHSA-1", Severity::Critical, "", &[]),
            advisory("osv", "GHSA-1", Severity::Critical, "", &[]),
        ]);
        assert_eq!(merged[0].source, "github");
        assert_eq!(merged[1].source, "osv");
        assert_eq!(merged[2].severity, Severity::Low);
    }

    #[test]
    fn distinct_source_id_pairs_are_not_merged() {
        let merged = merge_advisories(vec![
            advisory("osv", "GHSA-1", Severity::Low, "", &[]),
            advisory("github", "GHSA-1", Severity::Low, "", &[]),
        ]);
        assert_eq!(merged.len(), 2);
    }
}

#[cfg(test)]
mod http_tests {
    use std::path::PathBuf;

    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::Config;

    fn dep(name: &str) -> Dependency {
        Dependency::new(Ecosystem::Npm, name, "1.0.0", true, PathBuf::from("package.json"))
    }

    #[tokio::test]
    async fn fetch_advisories_merges_an_osv_hit_with_no_github_token_configured() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/querybatch"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [
                    {
                        "vulns": [
                            {
                                "id": "GHSA-osv-1",
                                "summary": "prototype pollution",
                                "severity": [{"type": "CVSS_V3", "score": "9.8"}],
                                "references": [{"url": "https://example.com/advisory"}]
                            }
                        ]
                    }
                ]
            })))
            .mount(&server)
            .await;

        let config = Config {
            osv_endpoint: format!("{}/v1/querybatch", server.uri()),
            disable_github_advisories: true,
            ..Config::default()
        };
        let aggregator = AdvisoryAggregator::new(&config);

        let deps = vec![dep("left-pad")];
        let result = aggregator.fetch_advisories(&deps).await.unwrap();

        let advisories = result.get(&deps[0].coordinate()).unwrap();
        assert_eq!(advisories.len(), 1);
        assert_eq!(advisories[0].identifier, "GHSA-osv-1");
        assert_eq!(advisories[0].severity, Severity::Critical);
    }

    #[tokio::test]
    async fn fetch_advisories_treats_osv_client_errors_as_empty_results() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/querybatch"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;

        let config = Config {
            osv_endpoint: format!("{}/v1/querybatch", server.uri()),
            disable_github_advisories: true,
            ..Config::default()
        };
        let aggregator = AdvisoryAggregator::new(&config);

        let deps = vec![dep("left-pad")];
        let result = aggregator.fetch_advisories(&deps).await.unwrap();
        assert!(result.get(&deps[0].coordinate()).unwrap().is_empty());
    }

    #[tokio::test]
    async fn fetch_advisories_retries_a_persistent_osv_server_error_before_failing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/querybatch"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let config = Config {
            osv_endpoint: format!("{}/v1/querybatch", server.uri()),
            http_retries: 1,
            disable_github_advisories: true,
            ..Config::default()
        };
        let aggregator = AdvisoryAggregator::new(&config);

        let deps = vec![dep("left-pad")];
        let err = aggregator.fetch_advisories(&deps).await.unwrap_err();
        assert!(matches!(err, AdvisoryError::RetriesExhausted(_)));
    }

    #[tokio::test]
    async fn fetch_advisories_falls_back_to_osv_only_on_invalid_github_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/querybatch"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [{}] })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let config = Config {
            osv_endpoint: format!("{}/v1/querybatch", server.uri()),
            github_graphql_endpoint: format!("{}/graphql", server.uri()),
            github_token: Some("bad-token".to_string()),
            ..Config::default()
        };
        let aggregator = AdvisoryAggregator::new(&config);

        let deps = vec![dep("left-pad")];
        let result = aggregator.fetch_advisories(&deps).await.unwrap();
        assert!(result.get(&deps[0].coordinate()).unwrap().is_empty());
    }
}
