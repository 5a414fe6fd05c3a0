//! Types for debrid service integration.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use thiserror::Error;

use crate::searcher::InfoHash;

/// Supported debrid services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DebridService {
    #[serde(rename = "realdebrid")]
    RealDebrid,
}

impl DebridService {
    /// Identifier used in request configs and cache fingerprints.
    pub fn as_str(&self) -> &'static str {
        match self {
            DebridService::RealDebrid => "realdebrid",
        }
    }

    /// Human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            DebridService::RealDebrid => "Real-Debrid",
        }
    }

    /// Short tag shown in stream labels.
    pub fn short_tag(&self) -> &'static str {
        match self {
            DebridService::RealDebrid => "RD",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "realdebrid" => Some(DebridService::RealDebrid),
            _ => None,
        }
    }
}

/// Per-request debrid credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct DebridAccount {
    pub service: DebridService,
    pub api_key: String,
}

impl fmt::Debug for DebridAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebridAccount")
            .field("service", &self.service)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Network route used for debrid calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Egress {
    Direct,
    Proxy,
}

/// Credentials plus the route chosen for one playback resolution.
#[derive(Debug, Clone)]
pub struct DebridSession {
    pub account: DebridAccount,
    pub egress: Egress,
}

/// A file the debrid service holds pre-cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableFile {
    pub filename: String,
    pub size_bytes: u64,
}

/// Instantly available files of one torrent, keyed by file index.
pub type AvailabilityRecord = BTreeMap<u32, AvailableFile>;

/// Availability of a set of hashes. Hashes with nothing cached are absent.
pub type AvailabilityMap = HashMap<InfoHash, AvailabilityRecord>;

/// A torrent added to a debrid account.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AddedTorrent {
    pub id: String,
    /// Status endpoint for the added torrent.
    pub uri: String,
}

/// Current state of an added torrent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TorrentInfo {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub links: Vec<String>,
}

/// Errors that can occur when talking to a debrid service.
#[derive(Debug, Error)]
pub enum DebridError {
    #[error("Debrid connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Debrid account rejected the API key")]
    Unauthorized,

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Torrent has no download links")]
    NoLinks,
}

impl From<reqwest::Error> for DebridError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            DebridError::Timeout
        } else if e.is_decode() {
            DebridError::ParseError(e.to_string())
        } else {
            DebridError::ConnectionFailed(e.to_string())
        }
    }
}

/// A debrid service backend.
///
/// Availability checks never fail as a whole: batches that error are logged
/// and their hashes are simply absent from the result.
#[async_trait]
pub trait DebridClient: Send + Sync {
    /// Which service this client speaks to.
    fn service(&self) -> DebridService;

    /// Whether a proxy route is available for blocked egress.
    fn proxy_configured(&self) -> bool;

    /// Whether the account behind `account` is a paying one.
    async fn check_premium(&self, account: &DebridAccount) -> Result<bool, DebridError>;

    /// Instantly available files for each hash.
    async fn instant_availability(
        &self,
        account: &DebridAccount,
        hashes: &[InfoHash],
    ) -> AvailabilityMap;

    /// Whether the service currently blocks this server's IP.
    async fn egress_blocked(&self) -> Result<bool, DebridError>;

    async fn add_magnet(
        &self,
        session: &DebridSession,
        hash: &InfoHash,
    ) -> Result<AddedTorrent, DebridError>;

    async fn torrent_info(
        &self,
        session: &DebridSession,
        torrent: &AddedTorrent,
    ) -> Result<TorrentInfo, DebridError>;

    async fn select_files(
        &self,
        session: &DebridSession,
        torrent: &AddedTorrent,
        file_index: u32,
    ) -> Result<(), DebridError>;

    /// Turn a hoster link into a direct download URL.
    async fn unrestrict_link(
        &self,
        session: &DebridSession,
        link: &str,
    ) -> Result<String, DebridError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_serde_id() {
        assert_eq!(
            serde_json::to_string(&DebridService::RealDebrid).unwrap(),
            "\"realdebrid\""
        );
        assert_eq!(DebridService::from_id("realdebrid"), Some(DebridService::RealDebrid));
        assert_eq!(DebridService::from_id("alldebrid"), None);
    }

    #[test]
    fn test_account_debug_redacts_key() {
        let account = DebridAccount {
            service: DebridService::RealDebrid,
            api_key: "super-secret".to_string(),
        };
        let debug = format!("{:?}", account);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("redacted"));
    }
}
