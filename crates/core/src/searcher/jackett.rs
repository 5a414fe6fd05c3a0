//! Jackett search backend implementation.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config::{IndexerBackendKind, IndexerConfig};

use super::{CandidateResult, CandidateSource, IndexerBackend, SearchError};

/// Jackett search backend implementation.
pub struct JackettBackend {
    client: Client,
    url: String,
    api_key: String,
}

impl JackettBackend {
    /// Create a new JackettBackend with the given configuration.
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

    /// Build the Jackett API URL for a search across the aggregate endpoint.
    fn build_search_url(&self, query: &str, indexers: &[String]) -> String {
        let mut url = format!(
            "{}/api/v2.0/indexers/all/results?apikey={}&Query={}",
            self.url,
            urlencoding::encode(&self.api_key),
            urlencoding::encode(query)
        );

        for indexer in indexers {
            url.push_str(&format!("&Tracker[]={}", urlencoding::encode(indexer)));
        }

        url
    }
}

#[async_trait]
impl IndexerBackend for JackettBackend {
    fn kind(&self) -> IndexerBackendKind {
        IndexerBackendKind::Jackett
    }

    async fn search(
        &self,
        query: &str,
        indexers: &[String],
    ) -> Result<Vec<CandidateResult>, SearchError> {
        let url = self.build_search_url(query, indexers);
        debug!(query = %query, indexers = ?indexers, "Searching Jackett");

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::ApiError(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let jackett_response: JackettResponse = response
            .json()
            .await
            .map_err(|e| SearchError::ParseError(e.to_string()))?;

        debug!(
            query = %query,
            results = jackett_response.Results.len(),
            "Jackett search complete"
        );

        Ok(jackett_response
            .Results
            .into_iter()
            .map(JackettResult::into_candidate)
            .collect())
    }
}

// Jackett API response types
#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct JackettResponse {
    Results: Vec<JackettResult>,
}

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct JackettResult {
    Title: String,
    MagnetUri: Option<String>,
    Link: Option<String>,
    InfoHash: Option<String>,
    Tracker: Option<String>,
}

impl JackettResult {
    fn into_candidate(self) -> CandidateResult {
        CandidateResult {
            title: self.Title,
            info_hash_hint: self.InfoHash.filter(|h| !h.is_empty()),
            // A magnet resolves without a fetch.
            download_ref: self.MagnetUri.or(self.Link),
            source: CandidateSource::Jackett,
            indexer: self.Tracker,
        }
    }
}
