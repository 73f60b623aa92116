use chrono::Utc;
use serde::Deserialize;

use crate::error::MetadataError;
use crate::models::ReleaseMetadata;
use crate::utils::dates::parse_flexible;

use super::super::http::{dedup_maintainers, get_json};

#[derive(Debug, Deserialize)]
struct NugetIndex {
    #[serde(default)]
    items: Vec<NugetPage>,
}

#[derive(Debug, Deserialize)]
struct NugetPage {
    #[serde(default)]
    items: Vec<NugetLeaf>,
}

#[derive(Debug, Deserialize)]
struct NugetLeaf {
    #[serde(rename = "catalogEntry")]
    catalog_entry: NugetCatalogEntry,
}

#[derive(Debug, Deserialize)]
struct NugetCatalogEntry {
    #[serde(default)]
    published: Option<String>,
    #[serde(default)]
    authors: Option<String>,
}

pub async fn fetch(client: &reqwest::Client, name: &str, retries: u32) -> Result<ReleaseMetadata, MetadataError> {
    let lowered = name.to_lowercase();
    let url = format!("https://api.nuget.org/v3/registration5-semver1/{lowered}/index.json");
    let parsed: Option<NugetIndex> = get_json(client, &url, "nuget", name, retries).await?;
    let Some(parsed) = parsed else {
        return Ok(ReleaseMetadata::empty("nuget"));
    };

    let now = Utc::now();
    let mut latest = None;
    let mut total_releases = 0u64;
    let mut releases_last_30d = 0u64;
    let mut authors: Vec<String> = Vec::new();

    for page in &parsed.items {
        for leaf in &page.items {
            total_releases += 1;
            if let Some(ts) = leaf.catalog_entry.published.as_deref().and_then(parse_flexible) {
                latest = Some(latest.map_or(ts, |v: chrono::DateTime<Utc>| v.max(ts)));
                if (now - ts).num_days() <= 30 {
                    releases_last_30d += 1;
                }
            }
            if let Some(a) = &leaf.catalog_entry.authors {
                authors.extend(a.split(',').map(|s| s.trim().to_string()));
            }
        }
    }

    Ok(ReleaseMetadata {
        latest_release: latest,
        releases_last_30d,
        total_releases,
        maintainers: dedup_maintainers(authors),
        ecosystem: "nuget".to_string(),
    })
}
