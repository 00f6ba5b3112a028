use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::feed::JobRecord;
use crate::geo::geocoder::CitySuggestion;
use crate::geo::Coordinates;
use crate::jobs::{distinct_locations, JobFilter, JobQuery};
use crate::state::AppState;

const MIN_QUERY_LEN: usize = 2;

#[derive(Serialize)]
pub struct JobListResponse {
    pub jobs: Vec<JobRecord>,
    pub total: usize,
    pub revision: u64,
    /// Distinct cities of the whole batch, not just the filtered jobs.
    pub locations: Vec<String>,
}

#[derive(Deserialize)]
pub struct GeocodeParams {
    #[serde(default)]
    pub q: String,
}

#[derive(Serialize)]
pub struct GeocodeResponse {
    pub query: String,
    pub coordinates: Coordinates,
}

/// GET /api/v1/jobs
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    Query(params): Query<JobQuery>,
) -> Result<Json<JobListResponse>, AppError> {
    let filter = JobFilter::from_query(params)?;

    // Read the revision first so a client never sees a revision newer than its data.
    let revision = state.store.revision();
    let all = state.store.snapshot();
    let locations = distinct_locations(&all);
    let jobs = filter.apply(all);

    Ok(Json(JobListResponse {
        total: jobs.len(),
        jobs,
        revision,
        locations,
    }))
}

/// GET /api/v1/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobRecord>, AppError> {
    state
        .store
        .get(&id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Job '{id}' not found")))
}

/// GET /api/v1/geocode/suggest
pub async fn handle_suggest_cities(
    State(state): State<AppState>,
    Query(params): Query<GeocodeParams>,
) -> Json<Vec<CitySuggestion>> {
    Json(state.geocoder.search_cities(&params.q).await)
}

/// GET /api/v1/geocode
pub async fn handle_geocode(
    State(state): State<AppState>,
    Query(params): Query<GeocodeParams>,
) -> Result<Json<GeocodeResponse>, AppError> {
    let query = params.q.trim();
    if query.chars().count() < MIN_QUERY_LEN {
        return Err(AppError::Validation(format!(
            "q must be at least {MIN_QUERY_LEN} characters"
        )));
    }

    let coordinates = state
        .geocoder
        .geocode_query(query)
        .await
        .ok_or_else(|| AppError::NotFound(format!("No location found for '{query}'")))?;

    Ok(Json(GeocodeResponse {
        query: query.to_string(),
        coordinates,
    }))
}
