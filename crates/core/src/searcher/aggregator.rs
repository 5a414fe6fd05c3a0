//! Concurrent fan-out of queries to an indexer backend.

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::metrics;

use super::{CandidateResult, IndexerBackend, SearchError};

/// Runs every sub-query of a request against one backend.
///
/// A failing or slow query contributes nothing; aggregation itself
/// never fails.
pub struct IndexerAggregator {
    backend: Arc<dyn IndexerBackend>,
    timeout: Duration,
}

impl IndexerAggregator {
    pub fn new(backend: Arc<dyn IndexerBackend>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    /// Run all queries concurrently and flatten their results.
    pub async fn search(&self, queries: &[String], indexers: &[String]) -> Vec<CandidateResult> {
        let backend = self.backend.kind().as_str();

        let results = join_all(queries.iter().map(|query| async move {
            let outcome = tokio::time::timeout(self.timeout, self.backend.search(query, indexers))
                .await
                .unwrap_or(Err(SearchError::Timeout));
            (query, outcome)
        }))
        .await;

        let mut candidates = Vec::new();
        for (query, outcome) in results {
            match outcome {
                Ok(found) => {
                    metrics::INDEXER_QUERIES
                        .with_label_values(&[backend, "success"])
                        .inc();
                    metrics::SEARCH_RESULTS
                        .with_label_values(&[backend])
                        .observe(found.len() as f64);
                    debug!(backend, query = %query, results = found.len(), "Indexer query complete");
                    candidates.extend(found);
                }
                Err(e) => {
                    let result = match e {
                        SearchError::Timeout => "timeout",
                        _ => "error",
                    };
                    metrics::INDEXER_QUERIES
                        .with_label_values(&[backend, result])
                        .inc();
                    warn!(backend, query = %query, error = %e, "Indexer query failed");
                }
            }
        }

        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockIndexer};

    fn queries(list: &[&str]) -> Vec<String> {
        list.iter().map(|q| q.to_string()).collect()
    }

    #[tokio::test]
    async fn test_flattens_all_queries() {
        let mock = Arc::new(MockIndexer::new());
        mock.set_results("Show", vec![fixtures::candidate("Show.S01.1080p", 'a')])
            .await;
        mock.set_results(
            "Show S01E02",
            vec![
                fixtures::candidate("Show.S01E02.720p", 'b'),
                fixtures::candidate("Show.S01E02.1080p", 'c'),
            ],
        )
        .await;
        let aggregator = IndexerAggregator::new(mock.clone(), Duration::from_secs(5));

        let indexers = vec!["yts".to_string()];
        let results = aggregator
            .search(&queries(&["Show", "Show S01E02"]), &indexers)
            .await;

        assert_eq!(results.len(), 3);
        let searches = mock.searches().await;
        assert_eq!(searches.len(), 2);
        assert!(searches.iter().all(|s| s.indexers == indexers));
    }

    #[tokio::test]
    async fn test_failed_query_contributes_nothing() {
        let mock = Arc::new(MockIndexer::new());
        mock.set_results("Show", vec![fixtures::candidate("Show.1080p", 'a')])
            .await;
        mock.fail_query("Show S01E02").await;
        let aggregator = IndexerAggregator::new(mock, Duration::from_secs(5));

        let results = aggregator
            .search(&queries(&["Show", "Show S01E02"]), &[])
            .await;
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_slow_query_times_out() {
        let mock = Arc::new(MockIndexer::new());
        mock.set_results("Fast", vec![fixtures::candidate("Fast.1080p", 'a')])
            .await;
        mock.set_results("Slow", vec![fixtures::candidate("Slow.1080p", 'b')])
            .await;
        mock.set_delay("Slow", Duration::from_secs(10)).await;
        let aggregator = IndexerAggregator::new(mock, Duration::from_millis(100));

        let results = aggregator.search(&queries(&["Fast", "Slow"]), &[]).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Fast.1080p");
    }

    #[tokio::test]
    async fn test_all_failing_is_empty() {
        let mock = Arc::new(MockIndexer::new());
        mock.fail_query("A").await;
        mock.fail_query("B").await;
        let aggregator = IndexerAggregator::new(mock, Duration::from_secs(1));

        assert!(aggregator.search(&queries(&["A", "B"]), &[]).await.is_empty());
    }
}
