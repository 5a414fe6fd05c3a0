//! The stream resolution pipeline.
//!
//! Account check, title lookup and cache lookup come first. On a miss one
//! request per fingerprint runs the search: indexers (plus Zilean), hash
//! resolution, debrid availability, file selection and ranking. The ranked
//! set is cached and every request then gets its own balanced, filtered
//! view of it.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::cache::{compute_fingerprint, Flight, ResultCache, SingleFlight};
use crate::debrid::DebridClient;
use crate::metadata::MetadataLookup;
use crate::metrics;
use crate::ranking::{RankedEntry, RankingOracle};
use crate::searcher::{CandidateResult, HashResolver, IndexerAggregator, IndexerBackend, ZileanClient};
use crate::selector::{select_balanced, select_files};

use super::format::{degraded_result, stream_result};
use super::{MediaQuery, MediaRequest, RequestConfig, StreamResult};

/// Everything the pipeline talks to.
pub struct PipelineDeps {
    pub indexer: Arc<dyn IndexerBackend>,
    pub indexer_timeout: Duration,
    pub zilean: Option<ZileanClient>,
    pub resolver: HashResolver,
    pub debrid: Arc<dyn DebridClient>,
    pub metadata: Arc<dyn MetadataLookup>,
    pub ranker: Arc<dyn RankingOracle>,
    pub cache: Arc<dyn ResultCache>,
    /// Shown in stream labels.
    pub addon_name: String,
    /// URL attached to degraded results.
    pub fallback_url: String,
}

/// Where the streams of a request came from (metrics label).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Cached,
    Fresh,
    Shared,
    Empty,
    Degraded,
}

impl Outcome {
    fn as_str(&self) -> &'static str {
        match self {
            Outcome::Cached => "cached",
            Outcome::Fresh => "fresh",
            Outcome::Shared => "shared",
            Outcome::Empty => "empty",
            Outcome::Degraded => "degraded",
        }
    }
}

/// Resolves stream requests into ranked, playable results.
pub struct StreamPipeline {
    aggregator: IndexerAggregator,
    zilean: Option<ZileanClient>,
    resolver: HashResolver,
    debrid: Arc<dyn DebridClient>,
    metadata: Arc<dyn MetadataLookup>,
    ranker: Arc<dyn RankingOracle>,
    cache: Arc<dyn ResultCache>,
    flights: SingleFlight<Arc<Vec<RankedEntry>>>,
    addon_name: String,
    fallback_url: String,
}

impl StreamPipeline {
    pub fn new(deps: PipelineDeps) -> Self {
        Self {
            aggregator: IndexerAggregator::new(deps.indexer, deps.indexer_timeout),
            zilean: deps.zilean,
            resolver: deps.resolver,
            debrid: deps.debrid,
            metadata: deps.metadata,
            ranker: deps.ranker,
            cache: deps.cache,
            flights: SingleFlight::new(),
            addon_name: deps.addon_name,
            fallback_url: deps.fallback_url,
        }
    }

    /// Resolve a request. Never fails: problems surface as a single
    /// degraded entry or an empty list.
    ///
    /// `public_base` and `config_segment` are used to build playback URLs.
    pub async fn resolve(
        &self,
        request: &MediaRequest,
        config: &RequestConfig,
        public_base: &str,
        config_segment: &str,
    ) -> Vec<StreamResult> {
        let started = Instant::now();
        let (outcome, streams) = self
            .run(request, config, public_base, config_segment)
            .await;

        metrics::PIPELINE_DURATION
            .with_label_values(&[outcome.as_str()])
            .observe(started.elapsed().as_secs_f64());
        info!(
            content_id = %request.content_id,
            kind = %request.kind,
            outcome = outcome.as_str(),
            streams = streams.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Stream request complete"
        );

        streams
    }

    async fn run(
        &self,
        request: &MediaRequest,
        config: &RequestConfig,
        public_base: &str,
        config_segment: &str,
    ) -> (Outcome, Vec<StreamResult>) {
        let service = config.account.service;

        match self.debrid.check_premium(&config.account).await {
            Ok(true) => {}
            Ok(false) => {
                return self.degraded(&format!("Invalid {} account.", service.display_name()));
            }
            Err(e) => {
                warn!(error = %e, "Debrid account check failed");
                return self.degraded(&format!(
                    "Unable to verify your {} account.",
                    service.display_name()
                ));
            }
        }

        let title = match self.metadata.title(&request.content_id).await {
            Ok(title) => title,
            Err(e) => {
                warn!(content_id = %request.content_id, error = %e, "Metadata lookup failed");
                return self.degraded(&format!(
                    "Unable to get metadata for {}.",
                    request.content_id
                ));
            }
        };

        let Some(query) = MediaQuery::for_request(request, title) else {
            return self.degraded("Invalid request.");
        };

        let fingerprint = compute_fingerprint(
            service,
            query.title(),
            query.season(),
            query.episode(),
            &config.indexers,
        );

        let (outcome, entries) = match self.cached(&fingerprint) {
            Some(entries) => (Outcome::Cached, entries),
            None => self.search_coalesced(&query, config, &fingerprint).await,
        };

        if entries.is_empty() {
            return (Outcome::Empty, Vec::new());
        }

        let streams = select_balanced(
            &entries,
            config.max_results,
            &config.resolutions,
            &config.languages,
        )
        .iter()
        .map(|entry| {
            stream_result(entry, service, &self.addon_name, public_base, config_segment)
        })
        .collect();

        (outcome, streams)
    }

    /// Run the search once per fingerprint across concurrent requests.
    ///
    /// Followers take the leader's result as is, so empty results and
    /// failed cache writes are shared too. A follower only searches itself
    /// when the leader went away without finishing.
    async fn search_coalesced(
        &self,
        query: &MediaQuery,
        config: &RequestConfig,
        fingerprint: &str,
    ) -> (Outcome, Vec<RankedEntry>) {
        loop {
            match self.flights.join(fingerprint) {
                Flight::Leader(guard) => {
                    // A previous leader may have finished since our lookup.
                    if let Some(entries) = self.cached(fingerprint) {
                        guard.complete(Arc::new(entries.clone()));
                        return (Outcome::Cached, entries);
                    }

                    let entries = self.search(query, config).await;
                    if let Err(e) = self.cache.store(fingerprint, &entries) {
                        warn!(fingerprint, error = %e, "Failed to store results");
                    }
                    guard.complete(Arc::new(entries.clone()));
                    return (Outcome::Fresh, entries);
                }
                Flight::Follower(waiter) => {
                    debug!(fingerprint, "Waiting for in-flight search");
                    if let Some(entries) = waiter.wait().await {
                        return (Outcome::Shared, entries.as_ref().clone());
                    }
                    if let Some(entries) = self.cached(fingerprint) {
                        return (Outcome::Cached, entries);
                    }
                }
            }
        }
    }

    /// Search, resolve, check availability, select and rank.
    async fn search(&self, query: &MediaQuery, config: &RequestConfig) -> Vec<RankedEntry> {
        let queries = query.search_queries();
        let (mut candidates, zilean) = tokio::join!(
            self.aggregator.search(&queries, &config.indexers),
            self.search_zilean(query.title()),
        );
        candidates.extend(zilean);

        if candidates.is_empty() {
            info!(title = query.title(), "No candidates found");
            return Vec::new();
        }

        let hashes = self.resolver.resolve_all(&candidates).await;
        debug!(
            title = query.title(),
            candidates = candidates.len(),
            hashes = hashes.len(),
            "Resolved info hashes"
        );
        if hashes.is_empty() {
            return Vec::new();
        }

        let availability = self
            .debrid
            .instant_availability(&config.account, &hashes)
            .await;

        let entries: Vec<RankedEntry> = select_files(&availability, query.season_episode())
            .into_iter()
            .map(|(info_hash, file)| {
                let ranked = self.ranker.rank(&file.filename, &info_hash);
                RankedEntry {
                    info_hash,
                    rank: ranked.rank,
                    profile: ranked.profile,
                    filename: file.filename,
                    size_bytes: file.size_bytes,
                    file_index: file.file_index,
                }
            })
            .collect();

        info!(
            title = query.title(),
            service = config.account.service.display_name(),
            cached_files = entries.len(),
            "Cached files found"
        );

        self.ranker.sort(entries)
    }

    async fn search_zilean(&self, title: &str) -> Vec<CandidateResult> {
        let Some(zilean) = &self.zilean else {
            return Vec::new();
        };
        match zilean.search(title).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(error = %e, "Zilean search failed");
                Vec::new()
            }
        }
    }

    /// Live cached entries; errors count as a miss.
    fn cached(&self, fingerprint: &str) -> Option<Vec<RankedEntry>> {
        match self.cache.lookup(fingerprint) {
            Ok(entry) => entry.map(|e| e.entries),
            Err(e) => {
                metrics::CACHE_LOOKUPS.with_label_values(&["error"]).inc();
                warn!(fingerprint, error = %e, "Cache lookup failed");
                None
            }
        }
    }

    fn degraded(&self, message: &str) -> (Outcome, Vec<StreamResult>) {
        (
            Outcome::Degraded,
            vec![degraded_result(&self.addon_name, message, &self.fallback_url)],
        )
    }
}
