//! Add-on manifest.

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub id: String,
    pub version: String,
    pub name: String,
    pub description: String,
    pub resources: Vec<String>,
    pub types: Vec<String>,
    pub id_prefixes: Vec<String>,
    pub catalogs: Vec<serde_json::Value>,
    pub behavior_hints: BehaviorHints,
}

#[derive(Debug, Serialize)]
pub struct BehaviorHints {
    pub configurable: bool,
}

/// Served for both `/manifest.json` and `/{config}/manifest.json`; the
/// configuration does not change the manifest.
pub async fn manifest(State(state): State<Arc<AppState>>) -> Json<Manifest> {
    let addon = &state.config().addon;
    Json(Manifest {
        id: addon.id.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        name: addon.name.clone(),
        description: "Debrid-backed torrent stream search".to_string(),
        resources: vec!["stream".to_string()],
        types: vec!["movie".to_string(), "series".to_string()],
        id_prefixes: vec!["tt".to_string()],
        catalogs: Vec::new(),
        behavior_hints: BehaviorHints { configurable: true },
    })
}
