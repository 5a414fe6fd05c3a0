//! Prowlarr search backend implementation.
//!
//! Prowlarr searches by numeric indexer id, so every search first lists the
//! configured indexers and maps the requested definition names to ids.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config::{IndexerBackendKind, IndexerConfig};

use super::{CandidateResult, CandidateSource, IndexerBackend, SearchError};

/// Prowlarr search backend implementation.
pub struct ProwlarrBackend {
    client: Client,
    url: String,
    api_key: String,
}

impl ProwlarrBackend {
    /// Create a new ProwlarrBackend with the given configuration.
    pub fn new(config: &IndexerConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    async fn get(&self, url: &str) -> Result<Response, SearchError> {
        let response = self
            .client
            .get(url)
            .header("X-Api-Key", &self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::ApiError(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        Ok(response)
    }

    /// Resolve definition names to Prowlarr indexer ids.
    async fn indexer_ids(&self, indexers: &[String]) -> Result<Vec<i64>, SearchError> {
        let url = format!("{}/api/v1/indexer", self.url);
        let all: Vec<ProwlarrIndexer> = self
            .get(&url)
            .await?
            .json()
            .await
            .map_err(|e| SearchError::ParseError(e.to_string()))?;

        Ok(matching_ids(&all, indexers))
    }

    fn build_search_url(&self, query: &str, ids: &[i64]) -> String {
        let mut url = format!(
            "{}/api/v1/search?query={}",
            self.url,
            urlencoding::encode(query)
        );
        for id in ids {
            url.push_str(&format!("&indexerIds={}", id));
        }
        url.push_str("&type=search");
        url
    }
}

fn matching_ids(all: &[ProwlarrIndexer], wanted: &[String]) -> Vec<i64> {
    all.iter()
        .filter(|i| wanted.iter().any(|w| w == &i.definition_name))
        .map(|i| i.id)
        .collect()
}

#[async_trait]
impl IndexerBackend for ProwlarrBackend {
    fn kind(&self) -> IndexerBackendKind {
        IndexerBackendKind::Prowlarr
    }

    async fn search(
        &self,
        query: &str,
        indexers: &[String],
    ) -> Result<Vec<CandidateResult>, SearchError> {
        let ids = self.indexer_ids(indexers).await?;
        debug!(query = %query, indexer_ids = ?ids, "Searching Prowlarr");

        let url = self.build_search_url(query, &ids);
        let results: Vec<ProwlarrResult> = self
            .get(&url)
            .await?
            .json()
            .await
            .map_err(|e| SearchError::ParseError(e.to_string()))?;

        debug!(query = %query, results = results.len(), "Prowlarr search complete");

        Ok(results
            .into_iter()
            .map(ProwlarrResult::into_candidate)
            .collect())
    }
}

// Prowlarr API response types
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProwlarrIndexer {
    id: i64,
    #[serde(default)]
    definition_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProwlarrResult {
    title: String,
    info_hash: Option<String>,
    download_url: Option<String>,
    magnet_url: Option<String>,
    indexer: Option<String>,
}

impl ProwlarrResult {
    fn into_candidate(self) -> CandidateResult {
        CandidateResult {
            title: self.title,
            info_hash_hint: self.info_hash.filter(|h| !h.is_empty()),
            download_ref: self.download_url.or(self.magnet_url),
            source: CandidateSource::Prowlarr,
            indexer: self.indexer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::http::spawn_server;
    use axum::{extract::RawQuery, http::HeaderMap, routing::get, Json, Router};
    use serde_json::json;

    fn config(url: &str) -> IndexerConfig {
        IndexerConfig {
            backend: IndexerBackendKind::Prowlarr,
            url: url.to_string(),
            api_key: "key".to_string(),
            timeout_secs: 5,
            indexers: vec![],
        }
    }

    #[test]
    fn test_matching_ids() {
        let all = vec![
            ProwlarrIndexer {
                id: 1,
                definition_name: "1337x".to_string(),
            },
            ProwlarrIndexer {
                id: 7,
                definition_name: "yts".to_string(),
            },
            ProwlarrIndexer {
                id: 9,
                definition_name: "nyaasi".to_string(),
            },
        ];
        let ids = matching_ids(&all, &["yts".to_string(), "1337x".to_string()]);
        assert_eq!(ids, vec![1, 7]);
    }

    #[test]
    fn test_build_search_url() {
        let backend = ProwlarrBackend::new(&config("http://localhost:9696"));
        assert_eq!(
            backend.build_search_url("Some Show S02E05", &[1, 7]),
            "http://localhost:9696/api/v1/search?query=Some%20Show%20S02E05&indexerIds=1&indexerIds=7&type=search"
        );
    }

    #[tokio::test]
    async fn test_search_maps_names_to_ids() {
        let app = Router::new()
            .route(
                "/api/v1/indexer",
                get(|headers: HeaderMap| async move {
                    assert_eq!(headers.get("X-Api-Key").unwrap(), "key");
                    Json(json!([
                        {"id": 3, "definitionName": "yts"},
                        {"id": 4, "definitionName": "eztv"}
                    ]))
                }),
            )
            .route(
                "/api/v1/search",
                get(|RawQuery(query): RawQuery| async move {
                    let query = query.unwrap_or_default();
                    let hits = if query.contains("indexerIds=3") && !query.contains("indexerIds=4") {
                        json!([{
                            "title": "Movie.2020.2160p",
                            "infoHash": "ABCDEF0123456789ABCDEF0123456789ABCDEF01",
                            "downloadUrl": "http://p/1",
                            "indexer": "YTS"
                        }])
                    } else {
                        json!([])
                    };
                    Json(hits)
                }),
            );
        let base = spawn_server(app).await;

        let backend = ProwlarrBackend::new(&config(&base));
        let results = backend.search("Movie", &["yts".to_string()]).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source, CandidateSource::Prowlarr);
        assert_eq!(results[0].indexer.as_deref(), Some("YTS"));
        assert_eq!(results[0].download_ref.as_deref(), Some("http://p/1"));
    }
}
