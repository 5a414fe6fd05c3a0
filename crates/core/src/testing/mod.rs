//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the external service
//! traits, so the whole pipeline can be exercised without indexers, a
//! debrid account or the metadata endpoint.
//!
//! # Example
//!
//! ```rust,ignore
//! use nimbus_core::testing::{fixtures, MockDebrid, MockIndexer, MockMetadata};
//!
//! let indexer = MockIndexer::new();
//! indexer.set_results("The Movie", vec![fixtures::candidate("The.Movie.1080p", 'a')]).await;
//!
//! let debrid = MockDebrid::new();
//! debrid.set_available(fixtures::info_hash('a'), fixtures::record(&[(1, "The.Movie.1080p.mkv", 1 << 30)])).await;
//! ```

mod mock_debrid;
mod mock_indexer;
mod mock_metadata;

#[cfg(test)]
pub mod http;

pub use mock_debrid::{DebridCall, DebridStep, MockDebrid};
pub use mock_indexer::{MockIndexer, RecordedSearch};
pub use mock_metadata::MockMetadata;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::debrid::{AvailabilityRecord, AvailableFile, DebridAccount, DebridService};
    use crate::ranking::{parse_title, RankedEntry};
    use crate::searcher::{CandidateResult, CandidateSource, InfoHash};
    use crate::selector::{LanguageFilter, ResolutionFilter};
    use crate::stream::RequestConfig;

    /// A valid hash made of one repeated hex digit.
    pub fn info_hash(digit: char) -> InfoHash {
        InfoHash::parse(&digit.to_string().repeat(40)).expect("fixture digit must be hex")
    }

    /// A Jackett candidate carrying an inline hash hint.
    pub fn candidate(title: &str, digit: char) -> CandidateResult {
        CandidateResult {
            title: title.to_string(),
            info_hash_hint: Some(digit.to_string().repeat(40)),
            download_ref: None,
            source: CandidateSource::Jackett,
            indexer: Some("mock-indexer".to_string()),
        }
    }

    /// A candidate that has to be resolved through its download link.
    pub fn linked_candidate(title: &str, download_ref: &str) -> CandidateResult {
        CandidateResult {
            title: title.to_string(),
            info_hash_hint: None,
            download_ref: Some(download_ref.to_string()),
            source: CandidateSource::Jackett,
            indexer: Some("mock-indexer".to_string()),
        }
    }

    /// Availability record from `(index, filename, size)` triples.
    pub fn record(files: &[(u32, &str, u64)]) -> AvailabilityRecord {
        files
            .iter()
            .map(|(index, filename, size_bytes)| {
                (
                    *index,
                    AvailableFile {
                        filename: filename.to_string(),
                        size_bytes: *size_bytes,
                    },
                )
            })
            .collect()
    }

    /// A ranked entry with a profile parsed from `filename`.
    pub fn ranked_entry(filename: &str, digit: char, rank: i64) -> RankedEntry {
        RankedEntry {
            info_hash: info_hash(digit),
            rank,
            profile: parse_title(filename),
            filename: filename.to_string(),
            size_bytes: 1024 * 1024 * 1024,
            file_index: 1,
        }
    }

    pub fn account() -> DebridAccount {
        DebridAccount {
            service: DebridService::RealDebrid,
            api_key: "mock-api-key".to_string(),
        }
    }

    /// Unfiltered, uncapped request config for the given indexers.
    pub fn request_config(indexers: &[&str]) -> RequestConfig {
        RequestConfig {
            account: account(),
            indexers: indexers.iter().map(|i| i.to_string()).collect(),
            max_results: 0,
            resolutions: ResolutionFilter::All,
            languages: LanguageFilter::All,
        }
    }
}
