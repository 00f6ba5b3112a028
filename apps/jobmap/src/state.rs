use std::sync::Arc;

use crate::config::Config;
use crate::geo::city_index::CityIndex;
use crate::geo::geocoder::Geocoder;
use crate::pipeline::JobStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Current job batch, filled by the refresh loop.
    pub store: Arc<JobStore>,
    pub index: Arc<CityIndex>,
    /// Same geocoder (and cache) the background resolution uses.
    pub geocoder: Arc<Geocoder>,
}
