//! Types shared by the search backends and the hash resolver.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::config::IndexerBackendKind;

/// Canonical torrent info hash: 40 uppercase hex characters.
///
/// Only constructible through [`InfoHash::parse`] (or the bencode hasher),
/// so every value in the pipeline is already validated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InfoHash(String);

impl InfoHash {
    /// Validate and normalize a hex digest. Surrounding whitespace is ignored.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.len() == 40 && trimmed.bytes().all(|b| b.is_ascii_hexdigit()) {
            Some(Self(trimmed.to_ascii_uppercase()))
        } else {
            None
        }
    }

    /// Build from a raw 20-byte SHA-1 digest.
    pub fn from_digest(digest: &[u8; 20]) -> Self {
        let hex: String = digest.iter().map(|b| format!("{:02X}", b)).collect();
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Magnet URI used when adding the torrent to a debrid account.
    pub fn magnet_uri(&self) -> String {
        format!("magnet:?xt=urn:btih:{}", self.0)
    }
}

impl fmt::Display for InfoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for InfoHash {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        InfoHash::parse(&value).ok_or_else(|| format!("invalid info hash: {}", value))
    }
}

impl From<InfoHash> for String {
    fn from(hash: InfoHash) -> Self {
        hash.0
    }
}

/// Which source produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    Jackett,
    Prowlarr,
    Zilean,
}

impl CandidateSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateSource::Jackett => "jackett",
            CandidateSource::Prowlarr => "prowlarr",
            CandidateSource::Zilean => "zilean",
        }
    }
}

impl From<IndexerBackendKind> for CandidateSource {
    fn from(kind: IndexerBackendKind) -> Self {
        match kind {
            IndexerBackendKind::Jackett => CandidateSource::Jackett,
            IndexerBackendKind::Prowlarr => CandidateSource::Prowlarr,
        }
    }
}

/// A search hit normalized across backend protocols.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateResult {
    /// Release title as reported by the indexer.
    pub title: String,
    /// Hash reported inline by the indexer, unvalidated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info_hash_hint: Option<String>,
    /// `.torrent` download URL or magnet URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_ref: Option<String>,
    pub source: CandidateSource,
    /// Tracker/indexer that reported the hit, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexer: Option<String>,
}

/// Errors that can occur during search operations.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search backend connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Search backend API error: {0}")]
    ApiError(String),

    #[error("Failed to parse backend response: {0}")]
    ParseError(String),

    #[error("Request timeout")]
    Timeout,
}

impl From<reqwest::Error> for SearchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SearchError::Timeout
        } else if e.is_connect() {
            SearchError::ConnectionFailed(e.to_string())
        } else if e.is_decode() {
            SearchError::ParseError(e.to_string())
        } else {
            SearchError::ApiError(e.to_string())
        }
    }
}

/// An indexer manager speaking one of the supported protocols.
#[async_trait]
pub trait IndexerBackend: Send + Sync {
    /// Protocol spoken by this backend (used for logging and metrics).
    fn kind(&self) -> IndexerBackendKind;

    /// Run one free-text query across the named indexers.
    async fn search(
        &self,
        query: &str,
        indexers: &[String],
    ) -> Result<Vec<CandidateResult>, SearchError>;
}
