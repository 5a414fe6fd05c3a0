//! Playback redirect endpoint.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use nimbus_core::searcher::InfoHash;
use std::sync::Arc;
use tracing::debug;

use crate::state::AppState;

/// `GET|HEAD /{config}/playback/{hash}/{index}`
///
/// Always answers 302: to the unrestricted link when resolution works, to
/// the fallback URL otherwise.
pub async fn playback(
    State(state): State<Arc<AppState>>,
    Path((config, hash, index)): Path<(String, String, String)>,
) -> Response {
    let resolver = state.playback();

    let Ok(request_config) = super::request_config(&state, &config) else {
        return redirect(resolver.fallback_url());
    };
    let (Some(info_hash), Ok(file_index)) = (InfoHash::parse(&hash), index.parse::<u32>()) else {
        debug!(hash = %hash, index = %index, "Rejected playback request");
        return redirect(resolver.fallback_url());
    };

    let url = resolver
        .resolve(&request_config.account, &info_hash, file_index)
        .await;
    redirect(&url)
}

fn redirect(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}
