//! Shared HTTP helper for registry adapters: GET + decode JSON under the
//! crate's retry policy. A 404 is treated as "package not found" rather than
//! a retryable failure.

use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::error::MetadataError;
use crate::utils::retry_with_backoff;

pub async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    ecosystem: &str,
    name: &str,
    retries: u32,
) -> Result<Option<T>, MetadataError> {
    let response = retry_with_backoff(
        retries,
        Duration::from_millis(200),
        || client.get(url).send(),
        |e| !e.is_status() || e.status().map(|s| s.is_server_error()).unwrap_or(true),
    )
    .await
    .map_err(|e| MetadataError::RequestFailed {
        ecosystem: ecosystem.to_string(),
        name: name.to_string(),
        reason: e.to_string(),
    })?;

    if response.status() == reqwest::StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !response.status().is_success() {
        return Err(MetadataError::RequestFailed {
            ecosystem: ecosystem.to_string(),
            name: name.to_string(),
            reason: format!("unexpected status {}", response.status()),
        });
    }

    response
        .json::<T>()
        .await
        .map(Some)
        .map_err(|e| MetadataError::ParseFailed {
            ecosystem: ecosystem.to_string(),
            name: name.to_string(),
            reason: e.to_string(),
        })
}

/// Case-insensitive, trimmed, order-preserving dedup of maintainer names,
/// dropping empties.
pub fn dedup_maintainers(names: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen_keys: Vec<String> = Vec::new();
    let mut out = Vec::new();
    for name in names {
        let trimmed = name.trim().to_string();
        if trimmed.is_empty() {
            continue;
        }
        let key = trimmed.to_lowercase();
        if !seen_keys.contains(&key) {
            seen_keys.push(key);
            out.push(trimmed);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Payload {
        name: String,
    }

    #[tokio::test]
    async fn returns_the_parsed_body_on_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pkg"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"name": "left-pad"})))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/pkg", server.uri());
        let result: Option<Payload> = get_json(&client, &url, "npm", "left-pad", 1).await.unwrap();
        assert_eq!(result, Some(Payload { name: "left-pad".to_string() }));
    }

    #[tokio::test]
    async fn treats_a_404_as_package_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pkg"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/pkg", server.uri());
        let result: Option<Payload> = get_json(&client, &url, "npm", "left-pad", 1).await.unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn surfaces_a_server_error_as_request_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pkg"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/pkg", server.uri());
        let result = get_json::<Payload>(&client, &url, "npm", "left-pad", 0).await;
        assert!(matches!(result, Err(MetadataError::RequestFailed { .. })));
    }

    #[tokio::test]
    async fn surfaces_malformed_json_as_parse_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pkg"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/pkg", server.uri());
        let result = get_json::<Payload>(&client, &url, "npm", "left-pad", 0).await;
        assert!(matches!(result, Err(MetadataError::ParseFailed { .. })));
    }
}
