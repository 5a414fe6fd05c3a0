//! Stream list endpoints.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use nimbus_core::stream::format::degraded_result;
use nimbus_core::{MediaRequest, StreamResult};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct StreamsResponse {
    pub streams: Vec<StreamResult>,
}

/// `GET /{config}/stream/{kind}/{id}.json`
pub async fn configured_streams(
    State(state): State<Arc<AppState>>,
    Path((config, kind, id)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Json<StreamsResponse> {
    let request_config = match super::request_config(&state, &config) {
        Ok(request_config) => request_config,
        Err(_) => return degraded(&state, "Invalid configuration."),
    };

    let id = id.strip_suffix(".json").unwrap_or(&id);
    let request = match MediaRequest::parse(&kind, id) {
        Ok(request) => request,
        Err(e) => {
            debug!(kind = %kind, id = %id, error = %e, "Rejected stream request");
            return Json(StreamsResponse {
                streams: Vec::new(),
            });
        }
    };

    let public_base = state.public_base(&headers);
    let streams = state
        .pipeline()
        .resolve(&request, &request_config, &public_base, &config)
        .await;

    Json(StreamsResponse { streams })
}

/// `GET /stream/{kind}/{id}.json`, reached before the add-on is configured.
pub async fn unconfigured_streams(
    State(state): State<Arc<AppState>>,
    Path((_kind, _id)): Path<(String, String)>,
) -> Json<StreamsResponse> {
    degraded(&state, "Add-on is not configured.")
}

fn degraded(state: &AppState, message: &str) -> Json<StreamsResponse> {
    Json(StreamsResponse {
        streams: vec![degraded_result(
            &state.config().addon.name,
            message,
            state.playback().fallback_url(),
        )],
    })
}
