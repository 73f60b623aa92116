use std::collections::HashMap;

use chrono::Utc;
use serde::Deserialize;

use crate::error::MetadataError;
use crate::models::ReleaseMetadata;
use crate::utils::dates::parse_flexible;

use super::super::http::{dedup_maintainers, get_json};

#[derive(Debug, Deserialize)]
struct PackagistResponse {
    package: PackagistPackage,
}

#[derive(Debug, Deserialize)]
struct PackagistPackage {
    #[serde(default)]
    versions: HashMap<String, PackagistVersion>,
}

#[derive(Debug, Deserialize)]
struct PackagistVersion {
    #[serde(default)]
    time: Option<String>,
    #[serde(default)]
    authors: Vec<PackagistAuthor>,
}

#[derive(Debug, Deserialize)]
struct PackagistAuthor {
    #[serde(default)]
    name: Option<String>,
}

/// Packagist names are `vendor/package`; callers without a `/` in the name
/// get empty metadata immediately.
pub async fn fetch(client: &reqwest::Client, name: &str, retries: u32) -> Result<ReleaseMetadata, MetadataError> {
    let Some((vendor, pkg)) = name.split_once('/') else {
        return Ok(ReleaseMetadata::empty("packagist"));
    };

    let url = format!("https://repo.packagist.org/packages/{vendor}/{pkg}.json");
    let parsed: Option<PackagistResponse> = get_json(client, &url, "packagist", name, retries).await?;
    let Some(parsed) = parsed else {
        return Ok(ReleaseMetadata::empty("packagist"));
    };

    let now = Utc::now();
    let mut latest = None;
    let mut releases_last_30d = 0u64;
    let mut authors: Vec<String> = Vec::new();

    for version in parsed.package.versions.values() {
        if let Some(ts) = version.time.as_deref().and_then(parse_flexible) {
            latest = Some(latest.map_or(ts, |v: chrono::DateTime<Utc>| v.max(ts)));
            if (now - ts).num_days() <= 30 {
                releases_last_30d += 1;
            }
        }
        authors.extend(version.authors.iter().filter_map(|a| a.name.clone()));
    }

    Ok(ReleaseMetadata {
        latest_release: latest,
        releases_last_30d,
        total_releases: parsed.package.versions.len() as u64,
        maintainers: dedup_maintainers(authors),
        ecosystem: "packagist".to_string(),
    })
}
