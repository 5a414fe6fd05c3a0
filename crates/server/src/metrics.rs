//! Prometheus metrics for observability.
//!
//! This module provides the HTTP-level metrics of the add-on server and
//! registers the pipeline metrics defined in `nimbus_core::metrics`.

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use regex_lite::Regex;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "nimbus_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("nimbus_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "nimbus_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

/// Request configurations that failed to decode.
pub static CONFIG_REJECTIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "nimbus_config_rejections_total",
            "Request configurations rejected while decoding",
        ),
        &["reason"],
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();
    registry
        .register(Box::new(CONFIG_REJECTIONS_TOTAL.clone()))
        .unwrap();

    // Core metrics (cache, indexers, debrid, pipeline)
    for metric in nimbus_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

static CONFIG_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/[^/]+/(manifest\.json|stream/|playback/)").unwrap());
static CONTENT_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/stream/([a-z]+)/[^/]+$").unwrap());
static HASH: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9a-fA-F]{40}").unwrap());
static NUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\d+(/|$)").unwrap());

/// Normalize a path for metric labels.
///
/// Configuration segments, content ids, info hashes and file indices are
/// replaced with placeholders so the label set stays bounded.
pub fn normalize_path(path: &str) -> String {
    if path == "/manifest.json" || path.starts_with("/stream/") {
        let result = CONTENT_ID.replace(path, "/stream/${1}/{id}");
        return result.to_string();
    }

    let result = CONFIG_SEGMENT.replace(path, "/{config}/${1}");
    let result = CONTENT_ID.replace(&result, "/stream/${1}/{id}");
    let result = HASH.replace_all(&result, "{hash}");
    let result = NUMERIC.replace_all(&result, "/{id}${1}");
    result.to_string()
}
