//! Info hash resolution for search candidates.
//!
//! A candidate's hash comes from, in order: the indexer's inline hint, a
//! magnet URI, or the `.torrent` download link (either the file body itself
//! or the hash embedded in a redirect's `Location`).

use std::collections::BTreeSet;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use once_cell::sync::Lazy;
use regex_lite::Regex;
use reqwest::{header::LOCATION, redirect, Client};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ResolverConfig;
use crate::metrics;

use super::torrent_parser::{parse_torrent_info_hash, TorrentParseError};
use super::{CandidateResult, InfoHash};

static HASH_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b([a-fA-F0-9]{40})\b").unwrap());

/// Errors that can occur while resolving a single candidate.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Candidate has no usable hash or download reference")]
    NoSource,

    #[error("Timeout fetching torrent")]
    Timeout,

    #[error("HTTP error: {0}")]
    Transport(String),

    #[error("Unexpected status: {0}")]
    UnexpectedStatus(u16),

    #[error("Redirect without Location header")]
    MissingLocation,

    #[error("No info hash in redirect location: {0}")]
    NoHashInLocation(String),

    #[error("No info hash in magnet URI")]
    InvalidMagnet,

    #[error("Torrent parse error: {0}")]
    Parse(#[from] TorrentParseError),
}

/// Find the first 40-hex-character hash in arbitrary text.
pub fn extract_info_hash(text: &str) -> Option<InfoHash> {
    HASH_PATTERN
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| InfoHash::parse(m.as_str()))
}

/// How a hash was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
    Hint,
    Magnet,
    Torrent,
    Redirect,
}

impl Method {
    fn as_str(&self) -> &'static str {
        match self {
            Method::Hint => "hint",
            Method::Magnet => "magnet",
            Method::Torrent => "torrent",
            Method::Redirect => "redirect",
        }
    }
}

/// Resolves candidates to canonical info hashes.
pub struct HashResolver {
    http_client: Client,
    max_parallel_fetches: usize,
}

impl HashResolver {
    /// Create a new resolver. Redirects are never followed.
    pub fn new(config: &ResolverConfig) -> Self {
        let http_client = Client::builder()
            .redirect(redirect::Policy::none())
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http_client,
            max_parallel_fetches: config.max_parallel_fetches.max(1),
        }
    }

    /// Resolve one candidate.
    pub async fn resolve(&self, candidate: &CandidateResult) -> Result<InfoHash, ResolveError> {
        self.resolve_with_method(candidate)
            .await
            .map(|(hash, _)| hash)
    }

    async fn resolve_with_method(
        &self,
        candidate: &CandidateResult,
    ) -> Result<(InfoHash, Method), ResolveError> {
        if let Some(hash) = candidate.info_hash_hint.as_deref().and_then(InfoHash::parse) {
            return Ok((hash, Method::Hint));
        }

        let download_ref = candidate
            .download_ref
            .as_deref()
            .filter(|r| !r.trim().is_empty())
            .ok_or(ResolveError::NoSource)?;

        if download_ref.starts_with("magnet:") {
            return extract_info_hash(download_ref)
                .map(|hash| (hash, Method::Magnet))
                .ok_or(ResolveError::InvalidMagnet);
        }

        self.fetch(download_ref).await
    }

    async fn fetch(&self, url: &str) -> Result<(InfoHash, Method), ResolveError> {
        let response = self.http_client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                ResolveError::Timeout
            } else {
                ResolveError::Transport(e.to_string())
            }
        })?;

        let status = response.status();

        if status.is_success() {
            let bytes = response.bytes().await.map_err(|e| {
                if e.is_timeout() {
                    ResolveError::Timeout
                } else {
                    ResolveError::Transport(e.to_string())
                }
            })?;
            let hash = parse_torrent_info_hash(&bytes)?;
            return Ok((hash, Method::Torrent));
        }

        if status.is_redirection() {
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .ok_or(ResolveError::MissingLocation)?;
            return extract_info_hash(location)
                .map(|hash| (hash, Method::Redirect))
                .ok_or_else(|| ResolveError::NoHashInLocation(location.to_string()));
        }

        Err(ResolveError::UnexpectedStatus(status.as_u16()))
    }

    /// Resolve every candidate concurrently and return the distinct hashes.
    ///
    /// Failures are logged and dropped. The result is sorted, so the order
    /// does not depend on network completion order.
    pub async fn resolve_all(&self, candidates: &[CandidateResult]) -> Vec<InfoHash> {
        let fetches: Vec<_> = candidates
            .iter()
            .enumerate()
            .map(|(idx, candidate)| async move {
                (idx, self.resolve_with_method(candidate).await)
            })
            .collect();
        let results: Vec<(usize, Result<(InfoHash, Method), ResolveError>)> =
            stream::iter(fetches)
                .buffer_unordered(self.max_parallel_fetches)
                .collect()
                .await;

        let mut hashes = BTreeSet::new();
        for (idx, result) in results {
            match result {
                Ok((hash, method)) => {
                    metrics::HASH_RESOLUTIONS
                        .with_label_values(&[method.as_str()])
                        .inc();
                    hashes.insert(hash);
                }
                Err(e) => {
                    metrics::HASH_RESOLUTIONS.with_label_values(&["failed"]).inc();
                    warn!(
                        title = %candidates[idx].title,
                        source = candidates[idx].source.as_str(),
                        error = %e,
                        "Failed to resolve info hash"
                    );
                }
            }
        }

        debug!(
            candidates = candidates.len(),
            hashes = hashes.len(),
            "Hash resolution complete"
        );

        hashes.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::searcher::CandidateSource;
    use crate::testing::http::spawn_server;
    use axum::{
        http::{header, StatusCode},
        routing::get,
        Router,
    };

    const HASH: &str = "0123456789abcdef0123456789abcdef01234567";

    const TORRENT: &[u8] =
        b"d8:announce3:url4:infod6:lengthi10e4:name5:a.mkv12:piece lengthi16e6:pieces20:bbbbbbbbbbbbbbbbbbbbee";

    fn candidate(hint: Option<&str>, download_ref: Option<&str>) -> CandidateResult {
        CandidateResult {
            title: "Some.Movie.2020.1080p".to_string(),
            info_hash_hint: hint.map(String::from),
            download_ref: download_ref.map(String::from),
            source: CandidateSource::Jackett,
            indexer: None,
        }
    }

    fn resolver() -> HashResolver {
        HashResolver::new(&ResolverConfig::default())
    }

    async fn fixture_server() -> String {
        let app = Router::new()
            .route("/file.torrent", get(|| async { TORRENT.to_vec() }))
            .route(
                "/redirect",
                get(|| async {
                    (
                        StatusCode::FOUND,
                        [(
                            header::LOCATION,
                            format!("magnet:?xt=urn:btih:{}&dn=Some.Movie", HASH),
                        )],
                    )
                }),
            )
            .route(
                "/redirect-nohash",
                get(|| async {
                    (
                        StatusCode::FOUND,
                        [(header::LOCATION, "http://elsewhere/download")],
                    )
                }),
            )
            .route("/bare-redirect", get(|| async { StatusCode::FOUND }))
            .route("/gone", get(|| async { StatusCode::NOT_FOUND }));
        spawn_server(app).await
    }

    #[test]
    fn test_extract_info_hash() {
        let text = format!("magnet:?xt=urn:btih:{}&dn=x", HASH);
        assert_eq!(
            extract_info_hash(&text).unwrap().as_str(),
            HASH.to_uppercase()
        );
        assert!(extract_info_hash("magnet:?xt=urn:btih:short").is_none());
        // 41 hex characters is not a hash
        assert!(extract_info_hash(&format!("{}a", HASH)).is_none());
    }

    #[tokio::test]
    async fn test_resolve_uses_hint_without_network() {
        let c = candidate(Some(HASH), Some("http://127.0.0.1:1/unreachable"));
        let hash = resolver().resolve(&c).await.unwrap();
        assert_eq!(hash.as_str(), HASH.to_uppercase());
    }

    #[tokio::test]
    async fn test_resolve_ignores_invalid_hint() {
        let c = candidate(Some("not-a-hash"), None);
        let result = resolver().resolve(&c).await;
        assert!(matches!(result, Err(ResolveError::NoSource)));
    }

    #[tokio::test]
    async fn test_resolve_magnet_without_network() {
        let magnet = format!("magnet:?xt=urn:btih:{}&dn=x", HASH.to_uppercase());
        let c = candidate(None, Some(&magnet));
        let hash = resolver().resolve(&c).await.unwrap();
        assert_eq!(hash.as_str(), HASH.to_uppercase());
    }

    #[tokio::test]
    async fn test_resolve_torrent_body() {
        let base = fixture_server().await;
        let c = candidate(None, Some(&format!("{}/file.torrent", base)));
        let hash = resolver().resolve(&c).await.unwrap();
        assert_eq!(hash, parse_torrent_info_hash(TORRENT).unwrap());
    }

    #[tokio::test]
    async fn test_resolve_redirect_location() {
        let base = fixture_server().await;
        let c = candidate(None, Some(&format!("{}/redirect", base)));
        let hash = resolver().resolve(&c).await.unwrap();
        assert_eq!(hash.as_str(), HASH.to_uppercase());
    }

    #[tokio::test]
    async fn test_resolve_redirect_failures() {
        let base = fixture_server().await;
        let r = resolver();

        let no_hash = r
            .resolve(&candidate(None, Some(&format!("{}/redirect-nohash", base))))
            .await;
        assert!(matches!(no_hash, Err(ResolveError::NoHashInLocation(_))));

        let bare = r
            .resolve(&candidate(None, Some(&format!("{}/bare-redirect", base))))
            .await;
        assert!(matches!(bare, Err(ResolveError::MissingLocation)));

        let gone = r
            .resolve(&candidate(None, Some(&format!("{}/gone", base))))
            .await;
        assert!(matches!(gone, Err(ResolveError::UnexpectedStatus(404))));
    }

    #[tokio::test]
    async fn test_resolve_all_dedups_and_drops_failures() {
        let base = fixture_server().await;
        let candidates = vec![
            candidate(Some(HASH), None),
            candidate(None, Some(&format!("{}/redirect", base))),
            candidate(None, Some(&format!("{}/file.torrent", base))),
            candidate(None, Some(&format!("{}/gone", base))),
            candidate(None, None),
        ];

        let hashes = resolver().resolve_all(&candidates).await;
        assert_eq!(hashes.len(), 2);
        assert!(hashes.iter().any(|h| h.as_str() == HASH.to_uppercase()));
        assert!(hashes.contains(&parse_torrent_info_hash(TORRENT).unwrap()));

        let mut sorted = hashes.clone();
        sorted.sort();
        assert_eq!(hashes, sorted);
    }
}
