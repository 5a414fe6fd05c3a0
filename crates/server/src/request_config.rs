//! Decoding of the per-request configuration path segment.
//!
//! The add-on client stores the user's settings as base64-encoded JSON and
//! prefixes every route with it:
//!
//! ```json
//! {
//!   "indexers": ["yts", "eztv"],
//!   "maxResults": 10,
//!   "resolutions": ["All"],
//!   "languages": ["English", "French"],
//!   "debridService": "realdebrid",
//!   "debridApiKey": "..."
//! }
//! ```

use base64::engine::general_purpose::{STANDARD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine as _;
use serde::Deserialize;
use thiserror::Error;

use nimbus_core::debrid::{DebridAccount, DebridService};
use nimbus_core::selector::{LanguageFilter, ResolutionFilter};
use nimbus_core::RequestConfig;

/// Errors for malformed request configurations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestConfigError {
    #[error("Configuration is not valid base64")]
    InvalidEncoding,

    #[error("Configuration is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("Unsupported debrid service: {0}")]
    UnknownService(String),

    #[error("Missing debrid API key")]
    MissingApiKey,
}

impl RequestConfigError {
    /// Metrics label.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::InvalidEncoding => "invalid_encoding",
            Self::InvalidJson(_) => "invalid_json",
            Self::UnknownService(_) => "unknown_service",
            Self::MissingApiKey => "missing_api_key",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRequestConfig {
    #[serde(default)]
    indexers: Vec<String>,
    #[serde(default)]
    max_results: usize,
    #[serde(default)]
    resolutions: Vec<String>,
    #[serde(default)]
    languages: Vec<String>,
    debrid_service: String,
    debrid_api_key: String,
}

/// Decode and validate a configuration segment.
///
/// When the deployment lists its indexers, requested indexers outside that
/// list are dropped.
pub fn decode_request_config(
    segment: &str,
    deployment_indexers: &[String],
) -> Result<RequestConfig, RequestConfigError> {
    let bytes = [&STANDARD, &URL_SAFE, &URL_SAFE_NO_PAD]
        .iter()
        .find_map(|engine| engine.decode(segment).ok())
        .ok_or(RequestConfigError::InvalidEncoding)?;

    let raw: RawRequestConfig = serde_json::from_slice(&bytes)
        .map_err(|e| RequestConfigError::InvalidJson(e.to_string()))?;

    let service = DebridService::from_id(&raw.debrid_service)
        .ok_or_else(|| RequestConfigError::UnknownService(raw.debrid_service.clone()))?;

    let api_key = raw.debrid_api_key.trim();
    if api_key.is_empty() {
        return Err(RequestConfigError::MissingApiKey);
    }

    let mut indexers: Vec<String> = Vec::new();
    for indexer in raw.indexers {
        let allowed = deployment_indexers.is_empty() || deployment_indexers.contains(&indexer);
        if allowed && !indexers.contains(&indexer) {
            indexers.push(indexer);
        }
    }

    Ok(RequestConfig {
        account: DebridAccount {
            service,
            api_key: api_key.to_string(),
        },
        indexers,
        max_results: raw.max_results,
        resolutions: resolution_filter(raw.resolutions),
        languages: language_filter(raw.languages),
    })
}

fn is_all(values: &[String]) -> bool {
    values.is_empty() || values.iter().any(|v| v.eq_ignore_ascii_case("all"))
}

fn resolution_filter(values: Vec<String>) -> ResolutionFilter {
    if is_all(&values) {
        ResolutionFilter::All
    } else {
        ResolutionFilter::Only(values)
    }
}

fn language_filter(values: Vec<String>) -> LanguageFilter {
    if is_all(&values) {
        LanguageFilter::All
    } else {
        LanguageFilter::Only(values.into_iter().map(|v| v.to_lowercase()).collect())
    }
}
