use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::{handlers, manifest, middleware::metrics_middleware, playback, stream};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health, config and metrics
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::metrics))
        // Manifest
        .route("/manifest.json", get(manifest::manifest))
        .route("/{config}/manifest.json", get(manifest::manifest))
        // Streams (ids arrive with a ".json" suffix)
        .route("/stream/{kind}/{id}", get(stream::unconfigured_streams))
        .route("/{config}/stream/{kind}/{id}", get(stream::configured_streams))
        // Playback (GET routes also answer HEAD)
        .route("/{config}/playback/{hash}/{index}", get(playback::playback))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        // Media clients fetch from arbitrary origins
        .layer(CorsLayer::permissive())
        .with_state(state)
}
