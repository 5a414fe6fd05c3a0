use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nimbus_core::{
    create_backend, load_config, validate_config, DebridClient, HashResolver, MetadataLookup,
    PipelineDeps, PlaybackResolver, RankingOracle, RealDebridClient, ResultCache,
    SanitizedConfig, SqliteResultCache, StreamPipeline, SuggestionClient, WeightedRanker,
    ZileanClient,
};
use nimbus_server::api::create_router;
use nimbus_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("NIMBUS_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    // Fingerprint of the effective (redacted) configuration, for log correlation
    let sanitized_json =
        serde_json::to_string(&SanitizedConfig::from(&config)).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(sanitized_json.as_bytes()));

    info!(
        version = VERSION,
        config_hash = &config_hash[..16],
        "Configuration loaded successfully"
    );
    info!("Database path: {:?}", config.database.path);

    // Result cache
    let cache: Arc<dyn ResultCache> = Arc::new(
        SqliteResultCache::new(
            &config.database.path,
            Duration::from_secs(config.cache.ttl_secs),
        )
        .context("Failed to create result cache")?,
    );
    info!(ttl_secs = config.cache.ttl_secs, "Result cache initialized");

    // Indexer backend
    let indexer = create_backend(&config.indexer);
    info!(
        backend = config.indexer.backend.as_str(),
        url = %config.indexer.url,
        indexers = config.indexer.indexers.len(),
        "Indexer backend initialized"
    );

    // Optional Zilean source
    let zilean = config.zilean.as_ref().map(|zilean_config| {
        info!(url = %zilean_config.url, "Zilean search enabled");
        ZileanClient::new(zilean_config)
    });

    // Debrid client, shared by the pipeline and playback resolution
    let debrid: Arc<dyn DebridClient> = Arc::new(RealDebridClient::new(&config.debrid));
    info!(
        api_url = %config.debrid.api_url,
        proxy = config.debrid.proxy_url.is_some(),
        "Debrid client initialized"
    );

    let metadata: Arc<dyn MetadataLookup> = Arc::new(SuggestionClient::new(&config.metadata));
    let ranker: Arc<dyn RankingOracle> = Arc::new(WeightedRanker::default());

    let pipeline = StreamPipeline::new(PipelineDeps {
        indexer,
        indexer_timeout: Duration::from_secs(config.indexer.timeout_secs as u64),
        zilean,
        resolver: HashResolver::new(&config.resolver),
        debrid: Arc::clone(&debrid),
        metadata,
        ranker,
        cache,
        addon_name: config.addon.name.clone(),
        fallback_url: config.debrid.fallback_url.clone(),
    });
    let playback = PlaybackResolver::new(debrid, config.debrid.fallback_url.clone());

    let addr = SocketAddr::new(config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, pipeline, playback));

    // Build router
    let app = create_router(state);

    // Start server
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
