//! On-disk cache tier for the metadata resolver: a single JSON file under
//! the user's cache directory, keyed by string, holding serialized
//! [`crate::models::ReleaseMetadata`]. This is the disk tier of the
//! resolver's two-tier cache; the in-memory tier and single-flight registry
//! live in [`crate::metadata`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CacheError;
use crate::models::ReleaseMetadata;

const CACHE_FILE_NAME: &str = "metadata-cache.json";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct DiskCacheFile {
    entries: HashMap<String, ReleaseMetadata>,
}

/// Resolve `~/.cache/deptrust` (or the platform equivalent via the `dirs`
/// crate), creating it if necessary.
pub fn resolve_cache_dir() -> Result<PathBuf, CacheError> {
    let base = dirs::cache_dir().ok_or(CacheError::DirectoryResolutionFailed)?;
    let dir = base.join("deptrust");
    std::fs::create_dir_all(&dir).map_err(|e| CacheError::WriteError {
        key: dir.display().to_string(),
        source: e,
    })?;
    Ok(dir)
}

/// A disk-backed key-value store for [`ReleaseMetadata`]. Not safe for
/// concurrent mutation from multiple processes; within a single process it
/// is always accessed under the resolver's mutex.
pub struct MetadataDiskCache {
    path: PathBuf,
    entries: HashMap<String, ReleaseMetadata>,
}

impl MetadataDiskCache {
    pub fn open(dir: &Path) -> Result<Self, CacheError> {
        let path = dir.join(CACHE_FILE_NAME);
        let entries = if path.exists() {
            let contents = std::fs::read_to_string(&path).map_err(|e| CacheError::ReadError {
                key: path.display().to_string(),
                source: e,
            })?;
            let parsed: DiskCacheFile = serde_json::from_str(&contents).unwrap_or_default();
            parsed.entries
        } else {
            HashMap::new()
        };
        Ok(Self { path, entries })
    }

    pub fn get(&self, key: &str) -> Option<&ReleaseMetadata> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: String, value: ReleaseMetadata) -> Result<(), CacheError> {
        self.entries.insert(key, value);
        self.flush()
    }

    pub fn clear(&mut self) -> Result<(), CacheError> {
        self.entries.clear();
        self.flush()
    }

    fn flush(&self) -> Result<(), CacheError> {
        let file = DiskCacheFile {
            entries: self.entries.clone(),
        };
        let serialized = serde_json::to_string(&file).map_err(|e| CacheError::SerializeError {
            key: self.path.display().to_string(),
            source: e,
        })?;
        std::fs::write(&self.path, serialized).map_err(|e| CacheError::WriteError {
            key: self.path.display().to_string(),
            source: e,
        })
    }
}
