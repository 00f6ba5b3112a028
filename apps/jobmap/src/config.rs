use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

pub const DEFAULT_FEED_URL: &str = "https://georezo.net/extern.php?type=rss&fid=10";
pub const DEFAULT_COMMUNES_URL: &str =
    "https://geo.api.gouv.fr/communes?fields=nom,codeDepartement,centre&format=json&geometry=centre";
pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org/search";
pub const DEFAULT_USER_AGENT: &str = "GeoRezoJobMap/1.0";

/// Application configuration loaded from environment variables.
/// Every variable is optional; a value that is set but unparsable is a startup error.
#[derive(Debug, Clone)]
pub struct Config {
    pub feed_url: String,
    pub communes_url: String,
    pub geocoder_url: String,
    pub geocoder_user_agent: String,
    pub geocode_cache_path: PathBuf,
    /// Courtesy wait before each uncached geocoding request.
    pub geocode_delay: Duration,
    pub suggest_delay: Duration,
    pub refresh_interval: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            feed_url: env_or("FEED_URL", DEFAULT_FEED_URL),
            communes_url: env_or("COMMUNES_URL", DEFAULT_COMMUNES_URL),
            geocoder_url: env_or("GEOCODER_URL", DEFAULT_GEOCODER_URL),
            geocoder_user_agent: env_or("GEOCODER_USER_AGENT", DEFAULT_USER_AGENT),
            geocode_cache_path: PathBuf::from(env_or("GEOCODE_CACHE_PATH", "geo_cache_v3.json")),
            geocode_delay: Duration::from_millis(parse_env("GEOCODE_DELAY_MS", 200)?),
            suggest_delay: Duration::from_millis(parse_env("SUGGEST_DELAY_MS", 100)?),
            refresh_interval: Duration::from_secs(parse_env("REFRESH_INTERVAL_SECS", 300)?),
            port: parse_env("PORT", 8080)?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}
