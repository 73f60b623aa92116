use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;
use tokio::sync::Semaphore;

use crate::error::MetadataError;
use crate::models::ReleaseMetadata;
use crate::utils::dates::parse_flexible;
use crate::utils::retry_with_backoff;

const MAX_VERSIONS_CHECKED: usize = 10;
const RETRY_DELAY: Duration = Duration::from_millis(200);

#[derive(Debug, Deserialize)]
struct GoVersionInfo {
    #[serde(rename = "Time")]
    time: String,
}

fn should_retry(e: &reqwest::Error) -> bool {
    !e.is_status() || e.status().map(|s| s.is_server_error()).unwrap_or(true)
}

/// The Go proxy exposes no maintainer identity at all.
pub async fn fetch(
    client: &reqwest::Client,
    module: &str,
    retries: u32,
    semaphore: &Arc<Semaphore>,
) -> Result<ReleaseMetadata, MetadataError> {
    let encoded_module = module.to_lowercase();
    let list_url = format!("https://proxy.golang.org/{encoded_module}/@v/list");
    let response = retry_with_backoff(retries, RETRY_DELAY, || client.get(&list_url).send(), should_retry)
        .await
        .map_err(|e| MetadataError::RequestFailed {
            ecosystem: "go".to_string(),
            name: module.to_string(),
            reason: e.to_string(),
        })?;

    if response.status() == reqwest::StatusCode::NOT_FOUND {
        return Ok(ReleaseMetadata::empty("go"));
    }
    if !response.status().is_success() {
        return Err(MetadataError::RequestFailed {
            ecosystem: "go".to_string(),
            name: module.to_string(),
            reason: format!("unexpected status {}", response.status()),
        });
    }

    let body = response.text().await.map_err(|e| MetadataError::ParseFailed {
        ecosystem: "go".to_string(),
        name: module.to_string(),
        reason: e.to_string(),
    })?;
    let versions: Vec<&str> = body.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    let total_releases = versions.len() as u64;

    let to_check: Vec<&str> = versions.iter().rev().take(MAX_VERSIONS_CHECKED).copied().collect();

    let mut handles = Vec::with_capacity(to_check.len());
    for version in to_check {
        let permit = Arc::clone(semaphore).acquire_owned().await.expect("semaphore is never closed");
        let client = client.clone();
        let url = format!("https://proxy.golang.org/{encoded_module}/@v/{version}.info");
        handles.push(tokio::spawn(async move {
            let _permit = permit;
            retry_with_backoff(retries, RETRY_DELAY, || client.get(&url).send(), should_retry)
                .await
                .map_err(|e| e.0)
        }));
    }

    let now = Utc::now();
    let mut latest = None;
    let mut releases_last_30d = 0u64;
    for handle in handles {
        let Ok(Ok(resp)) = handle.await else { continue };
        if !resp.status().is_success() {
            continue;
        }
        let Ok(info) = resp.json::<GoVersionInfo>().await else { continue };
        if let Some(ts) = parse_flexible(&info.time) {
            latest = Some(latest.map_or(ts, |v: chrono::DateTime<Utc>| v.max(ts)));
            if (now - ts).num_days() <= 30 {
                releases_last_30d += 1;
            }
        }
    }

    Ok(ReleaseMetadata {
        latest_release: latest,
        releases_last_30d,
        total_releases,
        maintainers: Vec::new(),
        ecosystem: "go".to_string(),
    })
}
