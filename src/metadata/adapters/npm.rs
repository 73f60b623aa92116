use std::collections::HashMap;

use chrono::Utc;
use serde::Deserialize;

use crate::error::MetadataError;
use crate::models::ReleaseMetadata;
use crate::utils::dates::parse_flexible;

use super::super::http::{dedup_maintainers, get_json};

#[derive(Debug, Deserialize)]
struct NpmResponse {
    #[serde(default)]
    time: HashMap<String, String>,
    #[serde(default)]
    maintainers: Vec<NpmMaintainer>,
    #[serde(default)]
    author: Option<NpmAuthor>,
}

#[derive(Debug, Deserialize)]
struct NpmMaintainer {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NpmAuthor {
    Name(String),
    Object { name: Option<String> },
}

pub async fn fetch(client: &reqwest::Client, name: &str, retries: u32) -> Result<ReleaseMetadata, MetadataError> {
    let url = format!("https://registry.npmjs.org/{name}");
    let parsed: Option<NpmResponse> = get_json(client, &url, "npm", name, retries).await?;
    let Some(parsed) = parsed else {
        return Ok(ReleaseMetadata::empty("npm"));
    };

    let now = Utc::now();
    let mut latest = None;
    let mut total_releases = 0u64;
    let mut releases_last_30d = 0u64;

    for (version, timestamp) in &parsed.time {
        if version == "created" || version == "modified" {
            continue;
        }
        if let Some(ts) = parse_flexible(timestamp) {
            total_releases += 1;
            latest = Some(latest.map_or(ts, |v: chrono::DateTime<Utc>| v.max(ts)));
            if (now - ts).num_days() <= 30 {
                releases_last_30d += 1;
            }
        }
    }

    let maintainers = if !parsed.maintainers.is_empty() {
        dedup_maintainers(parsed.maintainers.into_iter().filter_map(|m| m.name))
    } else {
        match parsed.author {
            Some(NpmAuthor::Name(n)) => dedup_maintainers([n]),
            Some(NpmAuthor::Object { name: Some(n) }) => dedup_maintainers([n]),
            _ => Vec::new(),
        }
    };

    Ok(ReleaseMetadata {
        latest_release: latest,
        releases_last_30d,
        total_releases,
        maintainers,
        ecosystem: "npm".to_string(),
    })
}
