use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    pub indexer: IndexerConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub debrid: DebridConfig,
    #[serde(default)]
    pub metadata: MetadataConfig,
    #[serde(default)]
    pub zilean: Option<ZileanConfig>,
    #[serde(default)]
    pub addon: AddonConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public base URL used in playback links. When unset, links are built
    /// from the incoming request's Host header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: None,
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8000
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("nimbus.db")
}

/// Result cache configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// How long a ranked result set stays valid (default: one day).
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
        }
    }
}

fn default_ttl_secs() -> u64 {
    86_400
}

/// Available indexer manager protocols
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum IndexerBackendKind {
    Jackett,
    Prowlarr,
}

impl IndexerBackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexerBackendKind::Jackett => "jackett",
            IndexerBackendKind::Prowlarr => "prowlarr",
        }
    }
}

/// Indexer manager configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndexerConfig {
    /// Which indexer manager protocol to speak
    pub backend: IndexerBackendKind,
    /// Indexer manager URL (e.g., "http://localhost:9117")
    pub url: String,
    /// Indexer manager API key
    pub api_key: String,
    /// Per-query timeout in seconds (default: 30)
    #[serde(default = "default_indexer_timeout")]
    pub timeout_secs: u32,
    /// Indexers clients may select; empty allows any
    #[serde(default)]
    pub indexers: Vec<String>,
}

fn default_indexer_timeout() -> u32 {
    30
}

/// Info-hash resolution configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverConfig {
    /// Timeout for fetching a single .torrent file (seconds).
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    /// Maximum concurrent .torrent downloads per request.
    #[serde(default = "default_max_parallel_fetches")]
    pub max_parallel_fetches: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: default_fetch_timeout_secs(),
            max_parallel_fetches: default_max_parallel_fetches(),
        }
    }
}

fn default_fetch_timeout_secs() -> u64 {
    5
}

fn default_max_parallel_fetches() -> usize {
    32
}

/// Debrid service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DebridConfig {
    /// REST API base URL
    #[serde(default = "default_debrid_api_url")]
    pub api_url: String,
    /// Page reporting whether the server's egress IP is blocked
    #[serde(default = "default_blacklist_url")]
    pub blacklist_url: String,
    /// Proxy used once the egress IP is reported as blocked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_url: Option<String>,
    /// Returned whenever a playback link cannot be produced
    #[serde(default = "default_fallback_url")]
    pub fallback_url: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_debrid_timeout")]
    pub timeout_secs: u32,
    /// Hashes per instant-availability request
    #[serde(default = "default_availability_batch_size")]
    pub availability_batch_size: usize,
}

impl Default for DebridConfig {
    fn default() -> Self {
        Self {
            api_url: default_debrid_api_url(),
            blacklist_url: default_blacklist_url(),
            proxy_url: None,
            fallback_url: default_fallback_url(),
            timeout_secs: default_debrid_timeout(),
            availability_batch_size: default_availability_batch_size(),
        }
    }
}

fn default_debrid_api_url() -> String {
    "https://api.real-debrid.com/rest/1.0".to_string()
}

fn default_blacklist_url() -> String {
    "https://real-debrid.com/vpn".to_string()
}

fn default_fallback_url() -> String {
    "https://nimbus.stream/unavailable".to_string()
}

fn default_debrid_timeout() -> u32 {
    30
}

fn default_availability_batch_size() -> usize {
    50
}

/// Title metadata lookup configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetadataConfig {
    #[serde(default = "default_metadata_url")]
    pub base_url: String,
    #[serde(default = "default_metadata_timeout")]
    pub timeout_secs: u32,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            base_url: default_metadata_url(),
            timeout_secs: default_metadata_timeout(),
        }
    }
}

fn default_metadata_url() -> String {
    "https://v3.sg.media-imdb.com/suggestion/a".to_string()
}

fn default_metadata_timeout() -> u32 {
    10
}

/// Zilean (DMM hash list) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ZileanConfig {
    pub url: String,
    #[serde(default = "default_zilean_timeout")]
    pub timeout_secs: u32,
}

fn default_zilean_timeout() -> u32 {
    30
}

/// Add-on identity advertised in the manifest and stream labels
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AddonConfig {
    #[serde(default = "default_addon_id")]
    pub id: String,
    #[serde(default = "default_addon_name")]
    pub name: String,
}

impl Default for AddonConfig {
    fn default() -> Self {
        Self {
            id: default_addon_id(),
            name: default_addon_name(),
        }
    }
}

fn default_addon_id() -> String {
    "stream.nimbus".to_string()
}

fn default_addon_name() -> String {
    "Nimbus".to_string()
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub indexer: SanitizedIndexerConfig,
    pub resolver: ResolverConfig,
    pub debrid: SanitizedDebridConfig,
    pub zilean_configured: bool,
    pub addon: AddonConfig,
}

/// Sanitized indexer config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedIndexerConfig {
    pub backend: String,
    pub url: String,
    pub api_key_configured: bool,
    pub timeout_secs: u32,
    pub indexers: Vec<String>,
}

/// Sanitized debrid config (proxy credentials hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedDebridConfig {
    pub api_url: String,
    pub proxy_configured: bool,
    pub timeout_secs: u32,
    pub availability_batch_size: usize,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            cache: config.cache.clone(),
            indexer: SanitizedIndexerConfig {
                backend: config.indexer.backend.as_str().to_string(),
                url: config.indexer.url.clone(),
                api_key_configured: !config.indexer.api_key.is_empty(),
                timeout_secs: config.indexer.timeout_secs,
                indexers: config.indexer.indexers.clone(),
            },
            resolver: config.resolver.clone(),
            debrid: SanitizedDebridConfig {
                api_url: config.debrid.api_url.clone(),
                proxy_configured: config.debrid.proxy_url.is_some(),
                timeout_secs: config.debrid.timeout_secs,
                availability_batch_size: config.debrid.availability_batch_size,
            },
            zilean_configured: config.zilean.is_some(),
            addon: config.addon.clone(),
        }
    }
}
