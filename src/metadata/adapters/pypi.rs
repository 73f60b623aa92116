use std::collections::HashMap;

use chrono::Utc;
use serde::Deserialize;

use crate::error::MetadataError;
use crate::models::ReleaseMetadata;
use crate::utils::dates::parse_flexible;

use super::super::http::{dedup_maintainers, get_json};

#[derive(Debug, Deserialize)]
struct PypiResponse {
    info: PypiInfo,
    #[serde(default)]
    releases: HashMap<String, Vec<PypiFile>>,
}

#[derive(Debug, Deserialize)]
struct PypiInfo {
    #[serde(default)]
    maintainers: Vec<PypiMaintainer>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    maintainer: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PypiMaintainer {
    #[serde(default)]
    username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PypiFile {
    #[serde(default)]
    yanked: bool,
    #[serde(default)]
    upload_time_iso_8601: Option<String>,
    #[serde(default)]
    upload_time: Option<String>,
}

pub async fn fetch(client: &reqwest::Client, name: &str, retries: u32) -> Result<ReleaseMetadata, MetadataError> {
    let url = format!("https://pypi.org/pypi/{name}/json");
    let parsed: Option<PypiResponse> = get_json(client, &url, "pypi", name, retries).await?;
    let Some(parsed) = parsed else {
        return Ok(ReleaseMetadata::empty("pypi"));
    };

    let mut latest = None;
    let mut total_releases = 0u64;
    let mut releases_last_30d = 0u64;
    let now = Utc::now();

    for files in parsed.releases.values() {
        let mut version_latest = None;
        for file in files {
            if file.yanked {
                continue;
            }
            let raw = file.upload_time_iso_8601.as_deref().or(file.upload_time.as_deref());
            if let Some(ts) = raw.and_then(parse_flexible) {
                version_latest = Some(version_latest.map_or(ts, |v: chrono::DateTime<Utc>| v.max(ts)));
            }
        }
        if let Some(ts) = version_latest {
            total_releases += 1;
            latest = Some(latest.map_or(ts, |v: chrono::DateTime<Utc>| v.max(ts)));
            if (now - ts).num_days() <= 30 {
                releases_last_30d += 1;
            }
        }
    }

    let maintainers = if !parsed.info.maintainers.is_empty() {
        dedup_maintainers(parsed.info.maintainers.into_iter().filter_map(|m| m.username))
    } else {
        dedup_maintainers(parsed.info.author.into_iter().chain(parsed.info.maintainer))
    };

    Ok(ReleaseMetadata {
        latest_release: latest,
        releases_last_30d,
        total_releases,
        maintainers,
        ecosystem: "pypi".to_string(),
    })
}
