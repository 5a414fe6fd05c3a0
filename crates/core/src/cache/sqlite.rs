//! SQLite-backed result cache implementation.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use super::{CacheEntry, CacheError, ResultCache};
use crate::metrics;
use crate::ranking::RankedEntry;

/// SQLite-backed result cache with a uniform TTL.
pub struct SqliteResultCache {
    conn: Mutex<Connection>,
    ttl: chrono::Duration,
}

impl SqliteResultCache {
    /// Open (or create) the cache database at `path`.
    pub fn new(path: &Path, ttl: Duration) -> Result<Self, CacheError> {
        let conn = Connection::open(path).map_err(|e| CacheError::Database(e.to_string()))?;
        Self::with_connection(conn, ttl)
    }

    /// Create an in-memory cache (useful for testing).
    pub fn in_memory(ttl: Duration) -> Result<Self, CacheError> {
        let conn =
            Connection::open_in_memory().map_err(|e| CacheError::Database(e.to_string()))?;
        Self::with_connection(conn, ttl)
    }

    fn with_connection(conn: Connection, ttl: Duration) -> Result<Self, CacheError> {
        Self::initialize_schema(&conn)?;
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| CacheError::Database(format!("invalid TTL: {}", e)))?;
        Ok(Self {
            conn: Mutex::new(conn),
            ttl,
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), CacheError> {
        conn.execute_batch(
            r#"
            -- Ranked result sets, one row per request fingerprint
            CREATE TABLE IF NOT EXISTS stream_cache (
                fingerprint TEXT PRIMARY KEY,
                created_at TEXT NOT NULL,
                results TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| CacheError::Database(e.to_string()))?;

        Ok(())
    }

    fn delete(conn: &Connection, fingerprint: &str) -> Result<(), CacheError> {
        conn.execute(
            "DELETE FROM stream_cache WHERE fingerprint = ?",
            params![fingerprint],
        )
        .map_err(|e| CacheError::Database(e.to_string()))?;
        Ok(())
    }
}

impl ResultCache for SqliteResultCache {
    fn lookup_at(
        &self,
        fingerprint: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<CacheEntry>, CacheError> {
        let conn = self.conn.lock().unwrap();

        let row: Option<(String, String)> = conn
            .query_row(
                "SELECT created_at, results FROM stream_cache WHERE fingerprint = ?",
                params![fingerprint],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(|e| CacheError::Database(e.to_string()))?;

        let Some((created_at, results)) = row else {
            metrics::CACHE_LOOKUPS.with_label_values(&["miss"]).inc();
            return Ok(None);
        };

        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| CacheError::Serialization(e.to_string()))?;

        if now - created_at >= self.ttl {
            debug!(fingerprint, created_at = %created_at, "Cache entry expired");
            Self::delete(&conn, fingerprint)?;
            metrics::CACHE_LOOKUPS.with_label_values(&["expired"]).inc();
            return Ok(None);
        }

        let entries: Vec<RankedEntry> = serde_json::from_str(&results)
            .map_err(|e| CacheError::Serialization(e.to_string()))?;

        if entries.is_empty() {
            metrics::CACHE_LOOKUPS.with_label_values(&["miss"]).inc();
            return Ok(None);
        }

        metrics::CACHE_LOOKUPS.with_label_values(&["hit"]).inc();
        Ok(Some(CacheEntry {
            fingerprint: fingerprint.to_string(),
            created_at,
            entries,
        }))
    }

    fn store_at(
        &self,
        fingerprint: &str,
        entries: &[RankedEntry],
        now: DateTime<Utc>,
    ) -> Result<(), CacheError> {
        let conn = self.conn.lock().unwrap();

        if entries.is_empty() {
            return Self::delete(&conn, fingerprint);
        }

        let results =
            serde_json::to_string(entries).map_err(|e| CacheError::Serialization(e.to_string()))?;

        conn.execute(
            "INSERT INTO stream_cache (fingerprint, created_at, results)
             VALUES (?, ?, ?)
             ON CONFLICT(fingerprint) DO UPDATE SET
                created_at = excluded.created_at,
                results = excluded.results",
            params![fingerprint, now.to_rfc3339(), results],
        )
        .map_err(|e| CacheError::Database(e.to_string()))?;

        debug!(fingerprint, entries = entries.len(), "Cached ranked results");
        Ok(())
    }
}
