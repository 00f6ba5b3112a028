use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Service version plus how far the data pipeline has come.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "jobmap",
        "city_index": {
            "loaded": state.index.is_loaded(),
            "communes": state.index.len()
        },
        "geocode_cache_entries": state.geocoder.cache().len(),
        "jobs": state.store.len(),
        "generation": state.store.generation(),
        "revision": state.store.revision(),
        "refresh_interval_secs": state.config.refresh_interval.as_secs()
    }))
}
