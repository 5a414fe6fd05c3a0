//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Result cache (hits, misses, expirations)
//! - Search (indexer queries, hash resolution)
//! - Debrid (availability batches, playback link resolution)
//! - Stream pipeline (end-to-end duration)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Result Cache Metrics
// =============================================================================

/// Cache lookups by outcome.
pub static CACHE_LOOKUPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("nimbus_cache_lookups_total", "Total result cache lookups"),
        &["result"], // "hit", "miss", "expired", "error"
    )
    .unwrap()
});

// =============================================================================
// Search Metrics
// =============================================================================

/// Indexer backend queries by backend and outcome.
pub static INDEXER_QUERIES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "nimbus_indexer_queries_total",
            "Total queries sent to indexer backends",
        ),
        &["backend", "result"], // result: "success", "error", "timeout"
    )
    .unwrap()
});

/// Candidates returned per indexer query.
pub static SEARCH_RESULTS: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "nimbus_search_results",
            "Number of candidates returned per indexer query",
        )
        .buckets(vec![0.0, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0]),
        &["backend"],
    )
    .unwrap()
});

/// Info hash resolutions by method or failure.
pub static HASH_RESOLUTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "nimbus_hash_resolutions_total",
            "Total info hash resolution attempts",
        ),
        &["result"], // "hint", "magnet", "torrent", "redirect", "failed"
    )
    .unwrap()
});

// =============================================================================
// Debrid Metrics
// =============================================================================

/// Instant availability batches by outcome.
pub static AVAILABILITY_BATCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "nimbus_availability_batches_total",
            "Total instant availability batch requests",
        ),
        &["result"], // "success", "error"
    )
    .unwrap()
});

/// Playback link resolutions by outcome.
pub static PLAYBACK_RESOLUTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "nimbus_playback_resolutions_total",
            "Total playback link resolutions",
        ),
        &["result"], // "resolved", "fallback"
    )
    .unwrap()
});

// =============================================================================
// Pipeline Metrics
// =============================================================================

/// End-to-end stream pipeline duration.
pub static PIPELINE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "nimbus_pipeline_duration_seconds",
            "Duration of stream resolution requests",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["outcome"], // "cached", "fresh", "shared", "empty", "degraded"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Cache
        Box::new(CACHE_LOOKUPS.clone()),
        // Search
        Box::new(INDEXER_QUERIES.clone()),
        Box::new(SEARCH_RESULTS.clone()),
        Box::new(HASH_RESOLUTIONS.clone()),
        // Debrid
        Box::new(AVAILABILITY_BATCHES.clone()),
        Box::new(PLAYBACK_RESOLUTIONS.clone()),
        // Pipeline
        Box::new(PIPELINE_DURATION.clone()),
    ]
}
