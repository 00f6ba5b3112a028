mod config;
mod errors;
mod feed;
mod geo;
mod jobs;
mod parsing;
mod pipeline;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::feed::HttpFeedSource;
use crate::geo::cache::GeocodeCache;
use crate::geo::city_index::{CityIndex, HttpCommuneSource};
use crate::geo::geocoder::{Geocoder, NominatimBackend};
use crate::geo::resolver::LocationResolver;
use crate::pipeline::{JobStore, Refresher};
use crate::routes::build_router;
use crate::state::AppState;

/// Timeout for the feed and commune dataset downloads.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting JobMap v{}", env!("CARGO_PKG_VERSION"));

    let download_client = reqwest::Client::builder()
        .timeout(DOWNLOAD_TIMEOUT)
        .build()?;
    // Geocoder keeps the transport defaults.
    let geocoder_client = reqwest::Client::new();

    let cache = Arc::new(GeocodeCache::load(config.geocode_cache_path.clone()));
    let geocoder = Arc::new(Geocoder::new(
        Arc::new(NominatimBackend::new(
            geocoder_client,
            config.geocoder_url.clone(),
            config.geocoder_user_agent.clone(),
        )),
        cache,
        config.geocode_delay,
        config.suggest_delay,
    ));
    info!("Geocoder initialized ({})", config.geocoder_url);

    let index = Arc::new(CityIndex::new(Arc::new(HttpCommuneSource::new(
        download_client.clone(),
        config.communes_url.clone(),
    ))));
    let resolver = Arc::new(LocationResolver::standard(index.clone(), geocoder.clone()));
    let store = Arc::new(JobStore::new());

    let feed = Arc::new(HttpFeedSource::new(download_client, config.feed_url.clone()));
    let refresher = Arc::new(Refresher::new(feed, resolver, store.clone()));
    refresher.spawn_loop(config.refresh_interval);
    info!(
        "Feed refresh every {}s from {}",
        config.refresh_interval.as_secs(),
        config.feed_url
    );

    let state = AppState {
        config: config.clone(),
        store,
        index,
        geocoder,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the web client has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
