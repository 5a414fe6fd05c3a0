//! Torrent search and info-hash resolution.
//!
//! This module provides an `IndexerBackend` trait for querying indexer
//! managers (Jackett, Prowlarr), the `IndexerAggregator` that fans queries
//! out across one backend, the optional Zilean source, and the
//! `HashResolver` that turns candidates into canonical info hashes.

mod aggregator;
mod hash_resolver;
mod jackett;
mod prowlarr;
pub mod torrent_parser;
mod types;
mod zilean;

pub use aggregator::IndexerAggregator;
pub use hash_resolver::{extract_info_hash, HashResolver, ResolveError};
pub use jackett::JackettBackend;
pub use prowlarr::ProwlarrBackend;
pub use torrent_parser::{parse_torrent_info_hash, TorrentParseError};
pub use types::*;
pub use zilean::ZileanClient;

use std::sync::Arc;

use crate::config::{IndexerBackendKind, IndexerConfig};

/// Create the indexer backend selected by configuration.
pub fn create_backend(config: &IndexerConfig) -> Arc<dyn IndexerBackend> {
    match config.backend {
        IndexerBackendKind::Jackett => Arc::new(JackettBackend::new(config)),
        IndexerBackendKind::Prowlarr => Arc::new(ProwlarrBackend::new(config)),
    }
}
