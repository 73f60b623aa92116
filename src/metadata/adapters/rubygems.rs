use chrono::Utc;
use serde::Deserialize;

use crate::error::MetadataError;
use crate::models::ReleaseMetadata;
use crate::utils::dates::parse_flexible;

use super::super::http::{dedup_maintainers, get_json};

#[derive(Debug, Deserialize)]
struct RubygemsVersion {
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    built_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RubygemsGem {
    #[serde(default)]
    authors: Option<String>,
}

pub async fn fetch(client: &reqwest::Client, name: &str, retries: u32) -> Result<ReleaseMetadata, MetadataError> {
    let versions_url = format!("https://rubygems.org/api/v1/versions/{name}.json");
    let versions: Option<Vec<RubygemsVersion>> = get_json(client, &versions_url, "rubygems", name, retries).await?;
    let Some(versions) = versions else {
        return Ok(ReleaseMetadata::empty("rubygems"));
    };

    let now = Utc::now();
    let mut latest = None;
    let mut releases_last_30d = 0u64;
    for version in &versions {
        let raw = version.created_at.as_deref().or(version.built_at.as_deref());
        if let Some(ts) = raw.and_then(parse_flexible) {
            latest = Some(latest.map_or(ts, |v: chrono::DateTime<Utc>| v.max(ts)));
            if (now - ts).num_days() <= 30 {
                releases_last_30d += 1;
            }
        }
    }

    let gem_url = format!("https://rubygems.org/api/v1/gems/{name}.json");
    let gem: Option<RubygemsGem> = get_json(client, &gem_url, "rubygems", name, retries)
        .await
        .unwrap_or(None);
    let maintainers = dedup_maintainers(
        gem.and_then(|g| g.authors)
            .map(|authors| authors.split(',').map(|s| s.trim().to_string()).collect::<Vec<_>>())
            .unwrap_or_default(),
    );

    Ok(ReleaseMetadata {
        latest_release: latest,
        releases_last_30d,
        total_releases: versions.len() as u64,
        maintainers,
        ecosystem: "rubygems".to_string(),
    })
}
