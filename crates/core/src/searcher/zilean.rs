//! Zilean DMM hash-list search.

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use crate::config::ZileanConfig;
use crate::ranking::{parse_title, title_match};

use super::{CandidateResult, CandidateSource, SearchError};

/// Client for a Zilean instance.
///
/// Zilean indexes debrid-cached hash lists by filename, so its results
/// are only kept when the parsed filename title matches the query title.
pub struct ZileanClient {
    client: Client,
    url: String,
}

impl ZileanClient {
    pub fn new(config: &ZileanConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            url: config.url.trim_end_matches('/').to_string(),
        }
    }

    /// Search for a title, returning only title-matched candidates.
    pub async fn search(&self, title: &str) -> Result<Vec<CandidateResult>, SearchError> {
        let url = format!("{}/dmm/search", self.url);
        debug!(title = %title, "Searching Zilean");

        let response = self
            .client
            .post(&url)
            .json(&json!({ "queryText": title }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SearchError::ApiError(format!("HTTP {}", response.status())));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchError::ParseError(e.to_string()))?;

        let entries = parse_entries(body)?;
        let total = entries.len();

        let candidates: Vec<CandidateResult> = entries
            .into_iter()
            .filter(|entry| title_match(title, &parse_title(&entry.filename).title))
            .map(ZileanEntry::into_candidate)
            .collect();

        debug!(
            title = %title,
            results = total,
            matched = candidates.len(),
            "Zilean search complete"
        );

        Ok(candidates)
    }
}

fn parse_entries(body: Value) -> Result<Vec<ZileanEntry>, SearchError> {
    if let Some(status) = body.get("status") {
        return Err(SearchError::ApiError(format!("Zilean status {}", status)));
    }
    serde_json::from_value(body).map_err(|e| SearchError::ParseError(e.to_string()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ZileanEntry {
    filename: String,
    info_hash: String,
}

impl ZileanEntry {
    fn into_candidate(self) -> CandidateResult {
        CandidateResult {
            title: self.filename,
            info_hash_hint: Some(self.info_hash),
            download_ref: None,
            source: CandidateSource::Zilean,
            indexer: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::http::spawn_server;
    use axum::{routing::post, Json, Router};

    fn client(url: &str) -> ZileanClient {
        ZileanClient::new(&ZileanConfig {
            url: url.to_string(),
            timeout_secs: 5,
        })
    }

    #[test]
    fn test_status_object_is_error() {
        let result = parse_entries(json!({"status": 500, "message": "boom"}));
        assert!(matches!(result, Err(SearchError::ApiError(_))));
    }

    #[tokio::test]
    async fn test_search_keeps_title_matches_only() {
        let app = Router::new().route(
            "/dmm/search",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["queryText"], "The Movie");
                Json(json!([
                    {"filename": "The.Movie.2020.1080p.WEB-DL.mkv", "infoHash": "a".repeat(40)},
                    {"filename": "Another.Film.2019.720p.mkv", "infoHash": "b".repeat(40)},
                    {"filename": "The Movie (2020) 2160p", "infoHash": "c".repeat(40)}
                ]))
            }),
        );
        let base = spawn_server(app).await;

        let results = client(&base).search("The Movie").await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.source == CandidateSource::Zilean));
        assert_eq!(results[0].info_hash_hint.as_deref(), Some("a".repeat(40).as_str()));
        assert_eq!(results[1].info_hash_hint.as_deref(), Some("c".repeat(40).as_str()));
    }

    #[tokio::test]
    async fn test_search_status_response() {
        let app = Router::new().route(
            "/dmm/search",
            post(|| async { Json(json!({"status": "error"})) }),
        );
        let base = spawn_server(app).await;

        let result = client(&base).search("The Movie").await;
        assert!(matches!(result, Err(SearchError::ApiError(_))));
    }
}
