use chrono::Utc;
use serde::Deserialize;

use crate::error::MetadataError;
use crate::models::ReleaseMetadata;
use crate::utils::dates::{parse_flexible, parse_millis};

use super::super::http::get_json;

#[derive(Debug, Deserialize)]
struct SolrEnvelope {
    response: SolrResponse,
}

#[derive(Debug, Deserialize)]
struct SolrResponse {
    #[serde(rename = "numFound")]
    num_found: u64,
    #[serde(default)]
    docs: Vec<SolrDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Timestamp {
    Millis(i64),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct SolrDoc {
    #[serde(default)]
    timestamp: Option<Timestamp>,
}

/// Maven coordinates are `group:artifact`; a bare name (no `:`) gets empty
/// metadata immediately. Maven's Solr index does not expose maintainer
/// identities.
pub async fn fetch(client: &reqwest::Client, name: &str, retries: u32) -> Result<ReleaseMetadata, MetadataError> {
    let Some((group, artifact)) = name.split_once(':') else {
        return Ok(ReleaseMetadata::empty("maven"));
    };

    let query = format!("g:\"{group}\" AND a:\"{artifact}\"");
    let url = format!(
        "https://search.maven.org/solrsearch/select?q={}&core=gav&rows=50&sort=timestamp+desc",
        urlencode(&query)
    );
    let parsed: Option<SolrEnvelope> = get_json(client, &url, "maven", name, retries).await?;
    let Some(parsed) = parsed else {
        return Ok(ReleaseMetadata::empty("maven"));
    };

    let now = Utc::now();
    let mut latest = None;
    let mut releases_last_30d = 0u64;
    let mut counted = 0u64;

    for doc in &parsed.response.docs {
        let ts = match &doc.timestamp {
            Some(Timestamp::Millis(ms)) => parse_millis(*ms),
            Some(Timestamp::Text(s)) => parse_flexible(s),
            None => None,
        };
        if let Some(ts) = ts {
            counted += 1;
            latest = Some(latest.map_or(ts, |v: chrono::DateTime<Utc>| v.max(ts)));
            if (now - ts).num_days() <= 30 {
                releases_last_30d += 1;
            }
        }
    }

    let total_releases = if counted > 0 { counted } else { parsed.response.num_found };

    Ok(ReleaseMetadata {
        latest_release: latest,
        releases_last_30d,
        total_releases,
        maintainers: Vec::new(),
        ecosystem: "maven".to_string(),
    })
}

fn urlencode(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes()).collect()
}
