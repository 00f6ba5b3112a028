pub mod health;

use axum::{routing::get, Router};

use crate::jobs::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/jobs", get(handlers::handle_list_jobs))
        .route("/api/v1/jobs/:id", get(handlers::handle_get_job))
        .route("/api/v1/geocode", get(handlers::handle_geocode))
        .route(
            "/api/v1/geocode/suggest",
            get(handlers::handle_suggest_cities),
        )
        .with_state(state)
}
