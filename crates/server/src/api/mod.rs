pub mod handlers;
pub mod manifest;
pub mod middleware;
pub mod playback;
pub mod routes;
pub mod stream;

pub use routes::create_router;

use tracing::debug;

use nimbus_core::RequestConfig;

use crate::metrics::CONFIG_REJECTIONS_TOTAL;
use crate::request_config::{decode_request_config, RequestConfigError};
use crate::state::AppState;

/// Decode a configuration path segment against the deployment's indexers,
/// counting rejections.
fn request_config(state: &AppState, segment: &str) -> Result<RequestConfig, RequestConfigError> {
    decode_request_config(segment, &state.config().indexer.indexers).map_err(|e| {
        CONFIG_REJECTIONS_TOTAL.with_label_values(&[e.reason()]).inc();
        debug!(error = %e, "Rejected request configuration");
        e
    })
}
