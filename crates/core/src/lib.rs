pub mod cache;
pub mod config;
pub mod debrid;
pub mod metadata;
pub mod metrics;
pub mod ranking;
pub mod searcher;
pub mod selector;
pub mod stream;
pub mod testing;

pub use cache::{compute_fingerprint, CacheEntry, CacheError, ResultCache, SqliteResultCache};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use debrid::{DebridClient, DebridError, PlaybackResolver, RealDebridClient};
pub use metadata::{MetadataError, MetadataLookup, SuggestionClient};
pub use ranking::{RankingOracle, WeightedRanker};
pub use searcher::{create_backend, HashResolver, IndexerBackend, ZileanClient};
pub use stream::{MediaRequest, PipelineDeps, RequestConfig, StreamPipeline, StreamResult};
