//! # Metadata Resolver
//!
//! Fetches per-ecosystem release/maintainer metadata from eight upstream
//! registries. Dispatch is a closed table keyed by [`Ecosystem`]; unknown
//! ecosystems (homebrew, conda, docker) return empty metadata with no
//! network call. Results are cached in two tiers (in-memory, on-disk) keyed
//! by the version-independent `{ecosystem}:{name}`, with single-flight
//! deduplication across concurrent callers for the same key.

pub mod adapters;
pub mod http;

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{OnceCell, Semaphore};

use crate::cache::MetadataDiskCache;
use crate::config::Config;
use crate::error::MetadataError;
use crate::models::{Dependency, Ecosystem, ReleaseMetadata};

type InflightCell = Arc<OnceCell<Result<ReleaseMetadata, Arc<MetadataError>>>>;

struct ResolverState {
    memory: HashMap<String, ReleaseMetadata>,
    inflight: HashMap<String, InflightCell>,
}

pub struct MetadataResolver {
    client: reqwest::Client,
    retries: u32,
    state: Mutex<ResolverState>,
    disk: Mutex<MetadataDiskCache>,
    gomod_semaphore: Arc<Semaphore>,
}

/// The cache key is version-independent: metadata describes the package,
/// not a specific release.
pub fn cache_key(ecosystem: &str, name: &str) -> String {
    format!("{}:{}", ecosystem.to_lowercase(), name.to_lowercase())
}

impl MetadataResolver {
    pub fn new(config: &Config, cache_dir: &Path) -> Result<Self, MetadataError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs_f64(config.http_timeout_secs))
            .user_agent("deptrust/0.1")
            .build()
            .expect("reqwest client builder is infallible for this configuration");

        let disk = MetadataDiskCache::open(cache_dir).map_err(|e| MetadataError::RequestFailed {
            ecosystem: "*".to_string(),
            name: "*".to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            retries: config.http_retries,
            state: Mutex::new(ResolverState {
                memory: HashMap::new(),
                inflight: HashMap::new(),
            }),
            disk: Mutex::new(disk),
            gomod_semaphore: Arc::new(Semaphore::new(config.gomod_concurrency.max(1))),
        })
    }

    /// Drop every cached entry in all three tiers, optionally cancelling
    /// inflight tasks. Cancellation here simply drops the registry entry;
    /// any already-spawned task continues but its result will be
    /// recomputed by the next caller rather than trusted.
    pub fn clear_cache(&self, cancel_inflight: bool) {
        let mut state = self.state.lock().unwrap();
        state.memory.clear();
        if cancel_inflight {
            state.inflight.clear();
        }
        drop(state);
        let _ = self.disk.lock().unwrap().clear();
    }

    pub async fn fetch(&self, dep: &Dependency) -> Result<ReleaseMetadata, Arc<MetadataError>> {
        let ecosystem = dep.normalized_ecosystem();
        let name = dep.normalized_name();
        let key = cache_key(&ecosystem, &name);

        if let Some(meta) = self.disk.lock().unwrap().get(&key) {
            return Ok(meta.clone());
        }

        let cell = {
            let mut state = self.state.lock().unwrap();
            if let Some(meta) = state.memory.get(&key) {
                return Ok(meta.clone());
            }
            if let Some(existing) = state.inflight.get(&key) {
                existing.clone()
            } else {
                let cell: InflightCell = Arc::new(OnceCell::new());
                state.inflight.insert(key.clone(), cell.clone());
                cell
            }
        };

        let result = cell
            .get_or_init(|| async { self.dispatch(dep).await.map_err(Arc::new) })
            .await
            .clone();

        {
            let mut state = self.state.lock().unwrap();
            state.inflight.remove(&key);
            if let Ok(meta) = &result {
                state.memory.insert(key.clone(), meta.clone());
            }
        }
        if let Ok(meta) = &result {
            let _ = self.disk.lock().unwrap().insert(key.clone(), meta.clone());
        }

        result
    }

    async fn dispatch(&self, dep: &Dependency) -> Result<ReleaseMetadata, MetadataError> {
        let name = dep.name.clone();
        match dep.ecosystem {
            Ecosystem::Pypi => adapters::pypi::fetch(&self.client, &name, self.retries).await,
            Ecosystem::Npm => adapters::npm::fetch(&self.client, &name, self.retries).await,
            Ecosystem::Crates => adapters::crates_io::fetch(&self.client, &name, self.retries).await,
            Ecosystem::Go => {
                adapters::go::fetch(&self.client, &name, self.retries, &self.gomod_semaphore).await
            }
            Ecosystem::Rubygems => adapters::rubygems::fetch(&self.client, &name, self.retries).await,
            Ecosystem::Maven => adapters::maven::fetch(&self.client, &name, self.retries).await,
            Ecosystem::Nuget => adapters::nuget::fetch(&self.client, &name, self.retries).await,
            Ecosystem::Packagist => adapters::packagist::fetch(&self.client, &name, self.retries).await,
            Ecosystem::Homebrew | Ecosystem::Conda | Ecosystem::Docker => {
                Ok(ReleaseMetadata::empty(dep.normalized_ecosystem()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::models::Dependency;

    #[test]
    fn cache_key_is_version_independent() {
        let a = cache_key("PyPI", "Requests");
        let b = cache_key("pypi", "requests");
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn unknown_ecosystems_return_empty_metadata_without_network() {
        let config = Config::default();
        let dir = tempfile::TempDir::new().unwrap();
        let resolver = MetadataResolver::new(&config, dir.path()).unwrap();
        let dep = Dependency::new(Ecosystem::Homebrew, "wget", "1.0", true, PathBuf::from("Brewfile"));
        let meta = resolver.fetch(&dep).await.unwrap();
        assert_eq!(meta.total_releases, 0);
        assert!(meta.maintainers.is_empty());
    }

    #[tokio::test]
    async fn concurrent_fetches_for_the_same_key_share_one_inflight_task() {
        // This exercises the single-flight bookkeeping directly rather than
        // real network adapters: two concurrent callers for a key that is
        // never resolved (no task ever completes) must observe the same
        // underlying `OnceCell`, proving only one would ever be driven to
        // completion.
        let state = Mutex::new(ResolverState {
            memory: HashMap::new(),
            inflight: HashMap::new(),
        });
        let calls = Arc::new(AtomicUsize::new(0));

        let register = |key: &str| -> InflightCell {
            let mut guard = state.lock().unwrap();
            if let Some(existing) = guard.inflight.get(key) {
                existing.clone()
            } else {
                let cell: InflightCell = Arc::new(OnceCell::new());
                guard.inflight.insert(key.to_string(), cell.clone());
                cell
            }
        };

        let cell_a = register("pypi:requests");
        let cell_b = register("pypi:requests");
        assert!(Arc::ptr_eq(&cell_a, &cell_b));

        let calls_clone = calls.clone();
        let _ = cell_a
            .get_or_init(|| async move {
                calls_clone.fetch_add(1, Ordering::SeqCst);
                Ok::<ReleaseMetadata, Arc<MetadataError>>(ReleaseMetadata::empty("pypi"))
            })
            .await;
        let _ = cell_b
            .get_or_init(|| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<ReleaseMetadata, Arc<MetadataError>>(ReleaseMetadata::empty("pypi"))
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
