//! Remote geocoding, the single point of entry for calls to the Nominatim-style API.
//!
//! Every query goes through the persistent cache first. Cache misses wait a fixed
//! courtesy delay before hitting the network; the public service asks clients to
//! stay at or below one request per second, and the resolution worker only ever
//! has one request in flight.
//!
//! Nothing here returns an error to callers: failures are logged and become `None`
//! (or an empty suggestion list).

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::geo::cache::GeocodeCache;
use crate::geo::{Coordinates, GeoError};

const COUNTRY_CODES: &str = "fr";
const SUGGESTION_LIMIT: u32 = 5;

/// Parameters of one search request.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest<'a> {
    pub query: &'a str,
    pub limit: u32,
    pub address_details: bool,
}

impl<'a> SearchRequest<'a> {
    pub fn top_match(query: &'a str) -> Self {
        Self {
            query,
            limit: 1,
            address_details: false,
        }
    }

    pub fn suggestions(query: &'a str) -> Self {
        Self {
            query,
            limit: SUGGESTION_LIMIT,
            address_details: true,
        }
    }
}

/// The API serves `lat`/`lon` as strings; some compatible servers send numbers.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CoordinateValue {
    Number(f64),
    Text(String),
}

impl CoordinateValue {
    fn to_f64(&self) -> Result<f64, GeoError> {
        match self {
            CoordinateValue::Number(n) => Ok(*n),
            CoordinateValue::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| GeoError::InvalidCoordinates(s.clone())),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HitAddress {
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
}

/// One search result.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeHit {
    pub lat: CoordinateValue,
    pub lon: CoordinateValue,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub address: Option<HitAddress>,
}

impl GeocodeHit {
    pub fn coordinates(&self) -> Result<Coordinates, GeoError> {
        Ok(Coordinates::new(self.lat.to_f64()?, self.lon.to_f64()?))
    }

    /// Settlement name: city, town or village from the address, else the result name.
    fn place_name(&self) -> Option<String> {
        self.address
            .as_ref()
            .and_then(|a| a.city.clone().or(a.town.clone()).or(a.village.clone()))
            .or_else(|| self.name.clone())
            .filter(|n| !n.trim().is_empty())
    }
}

/// A city proposed to the search box.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CitySuggestion {
    pub name: String,
    pub display_name: String,
    pub coordinates: Coordinates,
}

#[async_trait]
pub trait GeocodeBackend: Send + Sync {
    async fn search(&self, request: &SearchRequest<'_>) -> Result<Vec<GeocodeHit>, GeoError>;
}

/// Nominatim `/search` over HTTP.
pub struct NominatimBackend {
    client: Client,
    url: String,
    user_agent: String,
}

impl NominatimBackend {
    pub fn new(client: Client, url: String, user_agent: String) -> Self {
        Self {
            client,
            url,
            user_agent,
        }
    }
}

#[async_trait]
impl GeocodeBackend for NominatimBackend {
    async fn search(&self, request: &SearchRequest<'_>) -> Result<Vec<GeocodeHit>, GeoError> {
        let limit = request.limit.to_string();
        let mut params = vec![
            ("q", request.query),
            ("format", "json"),
            ("limit", limit.as_str()),
            ("countrycodes", COUNTRY_CODES),
        ];
        if request.address_details {
            params.push(("addressdetails", "1"));
        }

        let response = self
            .client
            .get(&self.url)
            .query(&params)
            .header("Accept", "application/json")
            .header("User-Agent", &self.user_agent)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeoError::Status {
                service: "geocoder",
                status: status.as_u16(),
            });
        }

        let raw = response.json::<Vec<serde_json::Value>>().await?;
        Ok(decode_hits(raw))
    }
}

/// Keeps the hits that decode; one malformed entry does not sink the others.
fn decode_hits(raw: Vec<serde_json::Value>) -> Vec<GeocodeHit> {
    raw.into_iter()
        .filter_map(|value| match serde_json::from_value::<GeocodeHit>(value) {
            Ok(hit) => Some(hit),
            Err(e) => {
                debug!("Skipping malformed geocoding hit: {e}");
                None
            }
        })
        .collect()
}

/// Cached, rate-limited geocoding on top of a [`GeocodeBackend`].
pub struct Geocoder {
    backend: Arc<dyn GeocodeBackend>,
    cache: Arc<GeocodeCache>,
    query_delay: Duration,
    suggest_delay: Duration,
}

impl Geocoder {
    pub fn new(
        backend: Arc<dyn GeocodeBackend>,
        cache: Arc<GeocodeCache>,
        query_delay: Duration,
        suggest_delay: Duration,
    ) -> Self {
        Self {
            backend,
            cache,
            query_delay,
            suggest_delay,
        }
    }

    pub fn cache(&self) -> &GeocodeCache {
        &self.cache
    }

    /// Resolves free text ("Quimper, Finistère, France") to the top match in France.
    ///
    /// A cached query never reaches the network again.
    pub async fn geocode_query(&self, text: &str) -> Option<Coordinates> {
        if text.chars().count() < 2 {
            return None;
        }

        if let Some(coords) = self.cache.get(text) {
            debug!("Geocode cache hit for \"{text}\"");
            return Some(coords);
        }

        tokio::time::sleep(self.query_delay).await;

        let hits = match self.backend.search(&SearchRequest::top_match(text)).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!("Geocoding failed for \"{text}\": {e}");
                return None;
            }
        };

        let Some(first) = hits.first() else {
            debug!("No geocoding result for \"{text}\"");
            return None;
        };

        match first.coordinates() {
            Ok(coords) => {
                self.remember(text, coords).await;
                Some(coords)
            }
            Err(e) => {
                warn!("Geocoding result for \"{text}\" unusable: {e}");
                None
            }
        }
    }

    /// Caches a result. A file-backed cache writes to disk, so that runs off the
    /// async workers.
    async fn remember(&self, text: &str, coords: Coordinates) {
        if !self.cache.is_persistent() {
            self.cache.insert(text, coords);
            return;
        }

        let cache = self.cache.clone();
        let query = text.to_string();
        if let Err(e) = tokio::task::spawn_blocking(move || cache.insert(&query, coords)).await {
            warn!("Geocode cache update for \"{text}\" did not complete: {e}");
        }
    }

    /// Up to five distinct settlements matching `text`, for the search box.
    pub async fn search_cities(&self, text: &str) -> Vec<CitySuggestion> {
        if text.chars().count() < 2 {
            return Vec::new();
        }

        tokio::time::sleep(self.suggest_delay).await;

        let hits = match self.backend.search(&SearchRequest::suggestions(text)).await {
            Ok(hits) => hits,
            Err(e) => {
                debug!("City search failed for \"{text}\": {e}");
                return Vec::new();
            }
        };

        let mut seen = HashSet::new();
        hits.into_iter()
            .filter_map(|hit| {
                let name = hit.place_name()?;
                let coordinates = hit.coordinates().ok()?;
                if !seen.insert(name.clone()) {
                    return None;
                }
                Some(CitySuggestion {
                    display_name: hit.display_name.clone().unwrap_or_else(|| name.clone()),
                    name,
                    coordinates,
                })
            })
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    /// Backend replaying canned hits and counting calls.
    pub(crate) struct CountingBackend {
        hits: Mutex<Vec<GeocodeHit>>,
        fail: bool,
        pub calls: AtomicUsize,
        pub queries: Mutex<Vec<String>>,
    }

    impl CountingBackend {
        pub(crate) fn returning(hits: Vec<GeocodeHit>) -> Self {
            Self {
                hits: Mutex::new(hits),
                fail: false,
                calls: AtomicUsize::new(0),
                queries: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn failing() -> Self {
            Self {
                fail: true,
                ..Self::returning(Vec::new())
            }
        }

        pub(crate) fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GeocodeBackend for CountingBackend {
        async fn search(
            &self,
            request: &SearchRequest<'_>,
        ) -> Result<Vec<GeocodeHit>, GeoError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.queries.lock().unwrap().push(request.query.to_string());
            if self.fail {
                return Err(GeoError::Status {
                    service: "geocoder",
                    status: 500,
                });
            }
            Ok(self.hits.lock().unwrap().clone())
        }
    }

    pub(crate) fn hit(lat: &str, lon: &str) -> GeocodeHit {
        GeocodeHit {
            lat: CoordinateValue::Text(lat.to_string()),
            lon: CoordinateValue::Text(lon.to_string()),
            name: None,
            display_name: None,
            address: None,
        }
    }

    pub(crate) fn geocoder(backend: Arc<CountingBackend>) -> Geocoder {
        Geocoder::new(
            backend,
            Arc::new(GeocodeCache::in_memory()),
            Duration::from_millis(200),
            Duration::from_millis(100),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_identical_query_hits_cache() {
        let backend = Arc::new(CountingBackend::returning(vec![hit("47.99", "-4.10")]));
        let geocoder = geocoder(backend.clone());

        let first = geocoder.geocode_query("Quimper, France").await;
        let second = geocoder.geocode_query("Quimper, France").await;

        assert_eq!(first, Some(Coordinates::new(47.99, -4.10)));
        assert_eq!(second, first);
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_only_on_cache_miss() {
        let backend = Arc::new(CountingBackend::returning(vec![hit("43.6", "1.44")]));
        let geocoder = geocoder(backend);

        let start = tokio::time::Instant::now();
        geocoder.geocode_query("Toulouse, France").await;
        assert!(start.elapsed() >= Duration::from_millis(200));

        let start = tokio::time::Instant::now();
        geocoder.geocode_query("Toulouse, France").await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_query_skips_network() {
        let backend = Arc::new(CountingBackend::returning(vec![hit("1", "1")]));
        let geocoder = geocoder(backend.clone());
        assert_eq!(geocoder.geocode_query("").await, None);
        assert_eq!(geocoder.geocode_query("A").await, None);
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_degrade_to_none() {
        let failing = Arc::new(CountingBackend::failing());
        let broken = geocoder(failing.clone());
        assert_eq!(broken.geocode_query("Brest, France").await, None);
        assert_eq!(broken.cache().len(), 0);

        let empty = Arc::new(CountingBackend::returning(Vec::new()));
        let no_results = geocoder(empty.clone());
        assert_eq!(no_results.geocode_query("Brest, France").await, None);
        // Misses are not cached: the next call asks again.
        assert_eq!(no_results.geocode_query("Brest, France").await, None);
        assert_eq!(empty.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_coordinates_are_not_cached() {
        let backend = Arc::new(CountingBackend::returning(vec![hit("north", "2.0")]));
        let geocoder = geocoder(backend);
        assert_eq!(geocoder.geocode_query("Somewhere, France").await, None);
        assert_eq!(geocoder.cache().len(), 0);
    }

    #[test]
    fn test_hit_accepts_string_and_numeric_coordinates() {
        let json = r#"[
            {"lat": "48.3905", "lon": "-4.4860", "display_name": "Brest"},
            {"lat": 43.2965, "lon": 5.3698}
        ]"#;
        let hits: Vec<GeocodeHit> = serde_json::from_str(json).unwrap();
        assert_eq!(
            hits[0].coordinates().unwrap(),
            Coordinates::new(48.3905, -4.4860)
        );
        assert_eq!(
            hits[1].coordinates().unwrap(),
            Coordinates::new(43.2965, 5.3698)
        );
    }

    #[test]
    fn test_malformed_hit_does_not_drop_the_others() {
        let raw: Vec<serde_json::Value> = serde_json::from_str(
            r#"[
                {"display_name": "No coordinates at all"},
                {"lat": "47.99", "lon": "-4.10", "name": "Quimper"},
                {"lat": ["nested"], "lon": "1.0"}
            ]"#,
        )
        .unwrap();

        let hits = decode_hits(raw);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name.as_deref(), Some("Quimper"));
        assert_eq!(hits[0].coordinates().unwrap(), Coordinates::new(47.99, -4.10));
    }

    #[tokio::test]
    async fn test_file_backed_results_survive_a_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("geo_cache.json");
        let backend = Arc::new(CountingBackend::returning(vec![hit("47.99", "-4.10")]));
        let geocoder = Geocoder::new(
            backend.clone(),
            Arc::new(GeocodeCache::load(&path)),
            Duration::ZERO,
            Duration::ZERO,
        );

        let (a, b) = tokio::join!(
            geocoder.geocode_query("Quimper, France"),
            geocoder.geocode_query("Brest, France")
        );
        assert!(a.is_some() && b.is_some());

        let reloaded = GeocodeCache::load(&path);
        assert_eq!(reloaded.len(), 2);
        assert_eq!(
            reloaded.get("Quimper, France"),
            Some(Coordinates::new(47.99, -4.10))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_cities_dedupes_and_prefers_address_names() {
        let json = r#"[
            {"lat": "45.76", "lon": "4.83", "name": "Lyon", "display_name": "Lyon, Rhône",
             "address": {"city": "Lyon"}},
            {"lat": "45.75", "lon": "4.85", "name": "Lyon 3e", "display_name": "Lyon 3e, Rhône",
             "address": {"city": "Lyon"}},
            {"lat": "45.70", "lon": "4.90", "name": "Bron", "display_name": "Bron, Rhône",
             "address": {"town": "Bron"}},
            {"lat": "45.60", "lon": "4.80", "display_name": "Unnamed"}
        ]"#;
        let hits: Vec<GeocodeHit> = serde_json::from_str(json).unwrap();
        let backend = Arc::new(CountingBackend::returning(hits));
        let geocoder = geocoder(backend);

        let suggestions = geocoder.search_cities("Lyon").await;
        let names: Vec<_> = suggestions.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Lyon", "Bron"]);
        assert_eq!(suggestions[0].display_name, "Lyon, Rhône");
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_cities_failure_is_empty() {
        let backend = Arc::new(CountingBackend::failing());
        let geocoder = geocoder(backend.clone());
        assert!(geocoder.search_cities("Lyon").await.is_empty());
        assert!(geocoder.search_cities("L").await.is_empty());
        assert_eq!(backend.call_count(), 1);
    }
}
