//! Common test utilities for E2E testing with mocks.
//!
//! This module provides a test fixture that builds the router in-process
//! with mock indexer, debrid and metadata services injected, so the add-on
//! routes can be exercised without external infrastructure.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use nimbus_core::testing::{MockDebrid, MockIndexer, MockMetadata};
use nimbus_core::{
    load_config_from_str, DebridClient, HashResolver, IndexerBackend, MetadataLookup,
    PipelineDeps, PlaybackResolver, ResultCache, SqliteResultCache, StreamPipeline,
    WeightedRanker,
};
use nimbus_server::state::AppState;

/// Re-export fixtures for test convenience
pub use nimbus_core::testing::fixtures;

pub const PUBLIC_URL: &str = "http://nimbus.test";
pub const FALLBACK_URL: &str = "https://nimbus.test/unavailable";

/// Test fixture for E2E testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_manifest() {
///     let fixture = TestFixture::new().await;
///     let response = fixture.get("/manifest.json").await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock indexer - configure search results
    pub indexer: Arc<MockIndexer>,
    /// Mock debrid - availability, account state and playback steps
    pub debrid: Arc<MockDebrid>,
    /// Mock metadata - titles by content id
    pub metadata: Arc<MockMetadata>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub text: String,
    pub body: Value,
}

impl TestFixture {
    /// Create a fixture with a configured public URL.
    pub async fn new() -> Self {
        Self::with_public_url(Some(PUBLIC_URL)).await
    }

    /// Create a fixture; without a public URL links follow the Host header.
    pub async fn with_public_url(public_url: Option<&str>) -> Self {
        let public_url_line = public_url
            .map(|url| format!("public_url = \"{}\"", url))
            .unwrap_or_default();
        let config = load_config_from_str(&format!(
            r#"
[server]
host = "127.0.0.1"
port = 8000
{}

[indexer]
backend = "jackett"
url = "http://indexer.test"
api_key = "secret"
indexers = ["yts", "eztv"]

[debrid]
fallback_url = "{}"
"#,
            public_url_line, FALLBACK_URL
        ))
        .expect("Failed to parse test config");

        let indexer = Arc::new(MockIndexer::new());
        let debrid = Arc::new(MockDebrid::new());
        let metadata = Arc::new(MockMetadata::new());
        let cache = Arc::new(
            SqliteResultCache::in_memory(Duration::from_secs(3600))
                .expect("Failed to create cache"),
        );

        let pipeline = StreamPipeline::new(PipelineDeps {
            indexer: Arc::clone(&indexer) as Arc<dyn IndexerBackend>,
            indexer_timeout: Duration::from_secs(5),
            zilean: None,
            resolver: HashResolver::new(&config.resolver),
            debrid: Arc::clone(&debrid) as Arc<dyn DebridClient>,
            metadata: Arc::clone(&metadata) as Arc<dyn MetadataLookup>,
            ranker: Arc::new(WeightedRanker::default()),
            cache: cache as Arc<dyn ResultCache>,
            addon_name: config.addon.name.clone(),
            fallback_url: config.debrid.fallback_url.clone(),
        });
        let playback = PlaybackResolver::new(
            Arc::clone(&debrid) as Arc<dyn DebridClient>,
            config.debrid.fallback_url.clone(),
        );

        let state = Arc::new(AppState::new(config, pipeline, playback));
        let router = nimbus_server::api::create_router(state);

        Self {
            router,
            indexer,
            debrid,
            metadata,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a HEAD request to the test server.
    pub async fn head(&self, path: &str) -> TestResponse {
        self.request("HEAD", path, None).await
    }

    /// Send a GET request with an explicit Host header.
    pub async fn get_with_host(&self, path: &str, host: &str) -> TestResponse {
        self.request("GET", path, Some(host)).await
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, host: Option<&str>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);
        if let Some(host) = host {
            request_builder = request_builder.header(header::HOST, host);
        }
        let request = request_builder.body(Body::empty()).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).to_string();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            location,
            text,
            body,
        }
    }
}

/// Encode a request configuration as a path-safe segment.
pub fn encode_config(config: Value) -> String {
    URL_SAFE.encode(config.to_string())
}

/// A valid configuration for the given indexers, unfiltered and uncapped.
pub fn valid_config(indexers: &[&str]) -> String {
    encode_config(json!({
        "indexers": indexers,
        "maxResults": 0,
        "resolutions": ["All"],
        "languages": ["All"],
        "debridService": "realdebrid",
        "debridApiKey": "mock-api-key"
    }))
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status, $response.status, $response.text
        );
    };
}
