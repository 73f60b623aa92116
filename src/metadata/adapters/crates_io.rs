use chrono::Utc;
use serde::Deserialize;

use crate::error::MetadataError;
use crate::models::ReleaseMetadata;
use crate::utils::dates::parse_flexible;

use super::super::http::{dedup_maintainers, get_json};

#[derive(Debug, Deserialize)]
struct CratesResponse {
    #[serde(default)]
    versions: Vec<CratesVersion>,
}

#[derive(Debug, Deserialize)]
struct CratesVersion {
    created_at: String,
}

#[derive(Debug, Deserialize)]
struct CratesTeamsResponse {
    #[serde(default)]
    teams: Vec<CratesTeam>,
}

#[derive(Debug, Deserialize)]
struct CratesTeam {
    login: String,
}

pub async fn fetch(client: &reqwest::Client, name: &str, retries: u32) -> Result<ReleaseMetadata, MetadataError> {
    let url = format!("https://crates.io/api/v1/crates/{name}");
    let parsed: Option<CratesResponse> = get_json(client, &url, "crates", name, retries).await?;
    let Some(parsed) = parsed else {
        return Ok(ReleaseMetadata::empty("crates"));
    };

    let now = Utc::now();
    let mut latest = None;
    let mut releases_last_30d = 0u64;
    for version in &parsed.versions {
        if let Some(ts) = parse_flexible(&version.created_at) {
            latest = Some(latest.map_or(ts, |v: chrono::DateTime<Utc>| v.max(ts)));
            if (now - ts).num_days() <= 30 {
                releases_last_30d += 1;
            }
        }
    }

    let teams_url = format!("https://crates.io/api/v1/crates/{name}/owner_team");
    let teams: Option<CratesTeamsResponse> = get_json(client, &teams_url, "crates", name, retries)
        .await
        .unwrap_or(None);
    let maintainers = dedup_maintainers(
        teams
            .map(|t| t.teams.into_iter().map(|t| t.login).collect::<Vec<_>>())
            .unwrap_or_default(),
    );

    Ok(ReleaseMetadata {
        latest_release: latest,
        releases_last_30d,
        total_releases: parsed.versions.len() as u64,
        maintainers,
        ecosystem: "crates".to_string(),
    })
}
