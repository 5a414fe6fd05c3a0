//! Types for the ranked-result cache.

use chrono::{DateTime, Utc};
use serde_json::json;
use thiserror::Error;

use crate::debrid::DebridService;
use crate::ranking::{normalize_title, RankedEntry};

/// A cached, ranked result set for one fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub fingerprint: String,
    pub created_at: DateTime<Utc>,
    /// Ranked entries, best first.
    pub entries: Vec<RankedEntry>,
}

/// Errors for cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Trait for ranked-result storage.
///
/// Entries older than the store's TTL are never returned. Storing an empty
/// result set removes the entry, so "nothing found" is never cached.
pub trait ResultCache: Send + Sync {
    /// Look up a live entry as of `now`.
    fn lookup_at(&self, fingerprint: &str, now: DateTime<Utc>)
        -> Result<Option<CacheEntry>, CacheError>;

    /// Insert or replace the entry for `fingerprint`, stamped `now`.
    fn store_at(
        &self,
        fingerprint: &str,
        entries: &[RankedEntry],
        now: DateTime<Utc>,
    ) -> Result<(), CacheError>;

    fn lookup(&self, fingerprint: &str) -> Result<Option<CacheEntry>, CacheError> {
        self.lookup_at(fingerprint, Utc::now())
    }

    fn store(&self, fingerprint: &str, entries: &[RankedEntry]) -> Result<(), CacheError> {
        self.store_at(fingerprint, entries, Utc::now())
    }
}

/// Cache key for a request.
///
/// MD5 of a canonical JSON document over the debrid service, normalized
/// title, season, episode and the sorted indexer set. Resolution and
/// language filters and the result cap are not part of the key; they are
/// applied after retrieval.
pub fn compute_fingerprint(
    service: DebridService,
    title: &str,
    season: Option<u32>,
    episode: Option<u32>,
    indexers: &[String],
) -> String {
    let mut indexers: Vec<&str> = indexers.iter().map(String::as_str).collect();
    indexers.sort_unstable();
    indexers.dedup();

    // serde_json maps are key-sorted, so this serialization is canonical.
    let document = json!({
        "debrid_service": service.as_str(),
        "title": normalize_title(title),
        "season": season,
        "episode": episode,
        "indexers": indexers,
    });

    format!("{:x}", md5::compute(document.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indexers(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_fingerprint_is_md5_hex() {
        let fp = compute_fingerprint(DebridService::RealDebrid, "The Movie", None, None, &[]);
        assert_eq!(fp.len(), 32);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_fingerprint_ignores_indexer_order() {
        let a = compute_fingerprint(
            DebridService::RealDebrid,
            "Show",
            Some(2),
            Some(5),
            &indexers(&["yts", "eztv", "1337x"]),
        );
        let b = compute_fingerprint(
            DebridService::RealDebrid,
            "Show",
            Some(2),
            Some(5),
            &indexers(&["1337x", "yts", "eztv", "yts"]),
        );
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_distinguishes_identity() {
        let base = compute_fingerprint(DebridService::RealDebrid, "Show", Some(2), Some(5), &[]);
        assert_ne!(
            base,
            compute_fingerprint(DebridService::RealDebrid, "Show", Some(2), Some(6), &[])
        );
        assert_ne!(
            base,
            compute_fingerprint(DebridService::RealDebrid, "Other Show", Some(2), Some(5), &[])
        );
        assert_ne!(
            base,
            compute_fingerprint(DebridService::RealDebrid, "Show", Some(2), Some(5), &indexers(&["yts"]))
        );
    }

    #[test]
    fn test_fingerprint_normalizes_title() {
        assert_eq!(
            compute_fingerprint(DebridService::RealDebrid, "Amélie", None, None, &[]),
            compute_fingerprint(DebridService::RealDebrid, "amelie", None, None, &[])
        );
    }
}
