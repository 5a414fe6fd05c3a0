//! Mock indexer backend for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::config::IndexerBackendKind;
use crate::searcher::{CandidateResult, IndexerBackend, SearchError};

/// A recorded search for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedSearch {
    pub query: String,
    pub indexers: Vec<String>,
}

/// Mock implementation of the IndexerBackend trait.
///
/// Results are configured per query text; unknown queries return nothing.
#[derive(Debug)]
pub struct MockIndexer {
    kind: IndexerBackendKind,
    results: Arc<RwLock<HashMap<String, Vec<CandidateResult>>>>,
    failing: Arc<RwLock<HashSet<String>>>,
    delays: Arc<RwLock<HashMap<String, Duration>>>,
    searches: Arc<RwLock<Vec<RecordedSearch>>>,
}

impl Default for MockIndexer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockIndexer {
    pub fn new() -> Self {
        Self::with_kind(IndexerBackendKind::Jackett)
    }

    pub fn with_kind(kind: IndexerBackendKind) -> Self {
        Self {
            kind,
            results: Arc::new(RwLock::new(HashMap::new())),
            failing: Arc::new(RwLock::new(HashSet::new())),
            delays: Arc::new(RwLock::new(HashMap::new())),
            searches: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Set the results returned for a query.
    pub async fn set_results(&self, query: &str, results: Vec<CandidateResult>) {
        self.results.write().await.insert(query.to_string(), results);
    }

    /// Make a query fail with a connection error.
    pub async fn fail_query(&self, query: &str) {
        self.failing.write().await.insert(query.to_string());
    }

    /// Delay the answer to a query.
    pub async fn set_delay(&self, query: &str, delay: Duration) {
        self.delays.write().await.insert(query.to_string(), delay);
    }

    /// Get all recorded searches.
    pub async fn searches(&self) -> Vec<RecordedSearch> {
        self.searches.read().await.clone()
    }
}

#[async_trait]
impl IndexerBackend for MockIndexer {
    fn kind(&self) -> IndexerBackendKind {
        self.kind
    }

    async fn search(
        &self,
        query: &str,
        indexers: &[String],
    ) -> Result<Vec<CandidateResult>, SearchError> {
        self.searches.write().await.push(RecordedSearch {
            query: query.to_string(),
            indexers: indexers.to_vec(),
        });

        let delay = self.delays.read().await.get(query).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.read().await.contains(query) {
            return Err(SearchError::ConnectionFailed("mock indexer down".to_string()));
        }

        Ok(self
            .results
            .read()
            .await
            .get(query)
            .cloned()
            .unwrap_or_default())
    }
}
