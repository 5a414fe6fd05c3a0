//! Title lookup for content identifiers.
//!
//! The suggestion endpoint answers `GET {base}/{id}.json` with
//! `{"d": [{"l": "<title>", ...}, ...]}`; the first suggestion's label is
//! the title used for searching.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::MetadataConfig;
use crate::ranking::fold_diacritics;

/// Errors from metadata lookups.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Metadata connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timeout")]
    Timeout,

    #[error("API error: {status}")]
    ApiError { status: u16 },

    #[error("No title found for {0}")]
    NotFound(String),

    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

impl From<reqwest::Error> for MetadataError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            MetadataError::Timeout
        } else if e.is_decode() {
            MetadataError::ParseError(e.to_string())
        } else {
            MetadataError::ConnectionFailed(e.to_string())
        }
    }
}

/// Resolves a content identifier to a searchable title.
#[async_trait]
pub trait MetadataLookup: Send + Sync {
    async fn title(&self, content_id: &str) -> Result<String, MetadataError>;
}

/// Client for the title-suggestion endpoint.
pub struct SuggestionClient {
    client: Client,
    base_url: String,
}

impl SuggestionClient {
    pub fn new(config: &MetadataConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SuggestionResponse {
    #[serde(default)]
    d: Vec<Suggestion>,
}

#[derive(Debug, Deserialize)]
struct Suggestion {
    l: Option<String>,
}

#[async_trait]
impl MetadataLookup for SuggestionClient {
    async fn title(&self, content_id: &str) -> Result<String, MetadataError> {
        let url = format!(
            "{}/{}.json",
            self.base_url,
            urlencoding::encode(content_id)
        );
        debug!(content_id, "Looking up title");

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(MetadataError::ApiError {
                status: response.status().as_u16(),
            });
        }

        let body: SuggestionResponse = response
            .json()
            .await
            .map_err(|e| MetadataError::ParseError(e.to_string()))?;

        body.d
            .into_iter()
            .next()
            .and_then(|s| s.l)
            .map(|title| fold_diacritics(title.trim()))
            .filter(|title| !title.is_empty())
            .ok_or_else(|| MetadataError::NotFound(content_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::http::spawn_server;
    use axum::{extract::Path, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
    use serde_json::json;

    async fn client() -> SuggestionClient {
        let app = Router::new().route(
            "/{file}",
            get(|Path(file): Path<String>| async move {
                match file.as_str() {
                    "tt0211915.json" => Json(json!({
                        "d": [{"l": "Amélie", "id": "tt0211915"}, {"l": "Other", "id": "tt1"}]
                    }))
                    .into_response(),
                    "tt0000000.json" => Json(json!({"d": []})).into_response(),
                    _ => StatusCode::NOT_FOUND.into_response(),
                }
            }),
        );
        let base = spawn_server(app).await;
        SuggestionClient::new(&MetadataConfig {
            base_url: base,
            timeout_secs: 5,
        })
    }

    #[tokio::test]
    async fn test_title_from_first_suggestion() {
        let client = client().await;
        assert_eq!(client.title("tt0211915").await.unwrap(), "Amelie");
    }

    #[tokio::test]
    async fn test_empty_suggestions_not_found() {
        let client = client().await;
        assert!(matches!(
            client.title("tt0000000").await,
            Err(MetadataError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_http_error() {
        let client = client().await;
        assert!(matches!(
            client.title("tt9999999").await,
            Err(MetadataError::ApiError { status: 404 })
        ));
    }
}
