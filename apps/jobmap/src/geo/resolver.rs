//! Turns a parsed (city, department) pair into coordinates.
//!
//! Resolution is an ordered list of tiers. Each tier says whether it can answer a
//! query and, if so, tries to; the first coordinates win. The standard order is:
//!
//! 1. local commune index (needs a city),
//! 2. department centroid (needs a recognized department code),
//! 3. remote geocoder (only when no department was recognized).
//!
//! Tier 2 answers every query with a known department, even when the city was not
//! found locally. Per-commune API calls are too slow for bulk resolution, so any
//! remaining ambiguity collapses to department-level accuracy.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::geo::city_index::CityIndex;
use crate::geo::departments;
use crate::geo::geocoder::Geocoder;
use crate::geo::Coordinates;

/// What the resolver is asked to place. Either field may be empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationQuery<'a> {
    pub city: &'a str,
    pub department: &'a str,
}

impl<'a> LocationQuery<'a> {
    pub fn new(city: &'a str, department: &'a str) -> Self {
        Self {
            city: city.trim(),
            department: department.trim(),
        }
    }

    fn department_filter(&self) -> Option<&'a str> {
        Some(self.department).filter(|d| !d.is_empty())
    }
}

#[async_trait]
pub trait ResolverTier: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether this tier has enough input to try at all.
    fn can_answer(&self, query: &LocationQuery<'_>) -> bool;

    async fn attempt(&self, query: &LocationQuery<'_>) -> Option<Coordinates>;
}

pub struct LocalIndexTier {
    index: Arc<CityIndex>,
}

impl LocalIndexTier {
    pub fn new(index: Arc<CityIndex>) -> Self {
        Self { index }
    }
}

#[async_trait]
impl ResolverTier for LocalIndexTier {
    fn name(&self) -> &'static str {
        "local_index"
    }

    fn can_answer(&self, query: &LocationQuery<'_>) -> bool {
        !query.city.is_empty()
    }

    async fn attempt(&self, query: &LocationQuery<'_>) -> Option<Coordinates> {
        self.index.lookup(query.city, query.department_filter())
    }
}

pub struct DepartmentCentroidTier;

#[async_trait]
impl ResolverTier for DepartmentCentroidTier {
    fn name(&self) -> &'static str {
        "department_centroid"
    }

    fn can_answer(&self, query: &LocationQuery<'_>) -> bool {
        departments::find(query.department).is_some()
    }

    async fn attempt(&self, query: &LocationQuery<'_>) -> Option<Coordinates> {
        let dept = departments::find(query.department)?;

        if query.city.is_empty() {
            debug!("No city, using centroid of {}", dept.name);
        } else if query.city.to_lowercase() == dept.name.to_lowercase() {
            // The parser captured the department name as a city ("Loire (42)").
            debug!("City \"{}\" is the department name", query.city);
        } else {
            debug!(
                "City \"{}\" not found locally, using centroid of {}",
                query.city, dept.name
            );
        }

        Some(dept.centroid)
    }
}

pub struct RemoteGeocodeTier {
    geocoder: Arc<Geocoder>,
}

impl RemoteGeocodeTier {
    pub fn new(geocoder: Arc<Geocoder>) -> Self {
        Self { geocoder }
    }
}

#[async_trait]
impl ResolverTier for RemoteGeocodeTier {
    fn name(&self) -> &'static str {
        "remote_geocoder"
    }

    fn can_answer(&self, query: &LocationQuery<'_>) -> bool {
        departments::find(query.department).is_none()
    }

    async fn attempt(&self, query: &LocationQuery<'_>) -> Option<Coordinates> {
        let text = remote_query(query)?;
        self.geocoder.geocode_query(&text).await
    }
}

/// Free-text query for the remote geocoder, or `None` when there is nothing to ask.
pub fn remote_query(query: &LocationQuery<'_>) -> Option<String> {
    let text = match (query.city, query.department) {
        ("", "") => String::new(),
        (city, "") => format!("{city}, France"),
        (city, code) => {
            let dept_name = departments::find(code).map(|d| d.name).unwrap_or(code);
            if city.is_empty() {
                format!("{dept_name}, France")
            } else {
                format!("{city}, {dept_name}, France")
            }
        }
    };

    if text.is_empty() || text == ", France" {
        None
    } else {
        Some(text)
    }
}

pub struct LocationResolver {
    index: Arc<CityIndex>,
    tiers: Vec<Arc<dyn ResolverTier>>,
}

impl LocationResolver {
    /// Local index, then department centroid, then remote geocoder.
    pub fn standard(index: Arc<CityIndex>, geocoder: Arc<Geocoder>) -> Self {
        let tiers: Vec<Arc<dyn ResolverTier>> = vec![
            Arc::new(LocalIndexTier::new(index.clone())),
            Arc::new(DepartmentCentroidTier),
            Arc::new(RemoteGeocodeTier::new(geocoder)),
        ];
        Self::with_tiers(index, tiers)
    }

    pub fn with_tiers(index: Arc<CityIndex>, tiers: Vec<Arc<dyn ResolverTier>>) -> Self {
        Self { index, tiers }
    }

    pub fn index(&self) -> &CityIndex {
        &self.index
    }

    /// Runs every tier in order; may hit the network.
    pub async fn resolve(&self, city: &str, department: &str) -> Option<Coordinates> {
        let query = LocationQuery::new(city, department);

        for tier in &self.tiers {
            if !tier.can_answer(&query) {
                continue;
            }
            if let Some(coords) = tier.attempt(&query).await {
                debug!(
                    tier = tier.name(),
                    "Resolved \"{}\" ({}) to {:?}",
                    query.city,
                    query.department,
                    coords
                );
                return Some(coords);
            }
        }

        None
    }

    /// Commune index only. Never touches the network.
    pub fn resolve_local(&self, city: &str, department: &str) -> Option<Coordinates> {
        let query = LocationQuery::new(city, department);
        if query.city.is_empty() {
            return None;
        }
        self.index.lookup(query.city, query.department_filter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::city_index::tests::{sample_communes, StaticCommunes};
    use crate::geo::geocoder::tests::{geocoder, hit, CountingBackend};

    async fn resolver_with(backend: Arc<CountingBackend>) -> LocationResolver {
        let index = Arc::new(CityIndex::new(Arc::new(StaticCommunes::new(
            sample_communes(),
        ))));
        index.load().await;
        LocationResolver::standard(index, Arc::new(geocoder(backend)))
    }

    fn centroid(code: &str) -> Coordinates {
        departments::find(code).unwrap().centroid
    }

    #[tokio::test(start_paused = true)]
    async fn test_indexed_city_never_calls_remote() {
        let backend = Arc::new(CountingBackend::returning(vec![hit("0", "0")]));
        let resolver = resolver_with(backend.clone()).await;

        let bourges = resolver.resolve("Bourges", "18").await;
        let lyon = resolver.resolve("Lyon", "").await;

        assert_eq!(bourges, Some(Coordinates::new(47.0810, 2.3987)));
        assert_eq!(lyon, Some(Coordinates::new(45.7640, 4.8357)));
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_city_known_department_is_centroid() {
        let backend = Arc::new(CountingBackend::returning(vec![hit("0", "0")]));
        let resolver = resolver_with(backend.clone()).await;

        assert_eq!(resolver.resolve("", "29").await, Some(centroid("29")));
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_department_name_as_city_is_centroid() {
        let backend = Arc::new(CountingBackend::returning(vec![hit("0", "0")]));
        let resolver = resolver_with(backend.clone()).await;

        assert_eq!(resolver.resolve("LOIRE", "42").await, Some(centroid("42")));
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_city_known_department_collapses_to_centroid() {
        let backend = Arc::new(CountingBackend::returning(vec![hit("0", "0")]));
        let resolver = resolver_with(backend.clone()).await;

        // Known name in another department: no namesake, centroid of the requested one.
        assert_eq!(resolver.resolve("Paris 12e", "75").await, Some(centroid("75")));
        assert_eq!(resolver.resolve("Valence", "07").await, Some(centroid("07")));
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_department_goes_remote() {
        let backend = Arc::new(CountingBackend::returning(vec![hit("47.87", "-3.55")]));
        let resolver = resolver_with(backend.clone()).await;

        let coords = resolver.resolve("Quimperlé", "").await;

        assert_eq!(coords, Some(Coordinates::new(47.87, -3.55)));
        assert_eq!(backend.call_count(), 1);
        assert_eq!(
            backend.queries.lock().unwrap().as_slice(),
            ["Quimperlé, France"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_unrecognized_department_goes_remote_with_raw_code() {
        let backend = Arc::new(CountingBackend::returning(vec![hit("42.0", "9.0")]));
        let resolver = resolver_with(backend.clone()).await;

        resolver.resolve("Corte", "20").await;

        assert_eq!(
            backend.queries.lock().unwrap().as_slice(),
            ["Corte, 20, France"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_nothing_to_resolve() {
        let backend = Arc::new(CountingBackend::returning(vec![hit("0", "0")]));
        let resolver = resolver_with(backend.clone()).await;

        assert_eq!(resolver.resolve("", "").await, None);
        assert_eq!(resolver.resolve("  ", " ").await, None);
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remote_failure_is_none() {
        let backend = Arc::new(CountingBackend::failing());
        let resolver = resolver_with(backend.clone()).await;
        assert_eq!(resolver.resolve("Nulle-Part", "").await, None);
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unloaded_index_falls_through_to_centroid() {
        let backend = Arc::new(CountingBackend::returning(vec![hit("0", "0")]));
        let index = Arc::new(CityIndex::new(Arc::new(StaticCommunes::failing())));
        index.load().await;
        let resolver = LocationResolver::standard(index, Arc::new(geocoder(backend.clone())));

        assert_eq!(resolver.resolve("Bourges", "18").await, Some(centroid("18")));
        assert_eq!(resolver.resolve_local("Bourges", "18"), None);
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_resolve_local_uses_index_only() {
        let backend = Arc::new(CountingBackend::returning(vec![hit("0", "0")]));
        let resolver = resolver_with(backend.clone()).await;

        assert!(resolver.resolve_local("Paris", "75").is_some());
        assert_eq!(resolver.resolve_local("", "75"), None);
        assert_eq!(resolver.resolve_local("Quimperlé", ""), None);
        assert_eq!(backend.call_count(), 0);
    }

    #[test]
    fn test_remote_query_shapes() {
        let q = |city, dept| remote_query(&LocationQuery::new(city, dept));
        assert_eq!(q("Brest", ""), Some("Brest, France".to_string()));
        assert_eq!(q("Brest", "29"), Some("Brest, Finistère, France".to_string()));
        assert_eq!(q("", "29"), Some("Finistère, France".to_string()));
        assert_eq!(q("", "20"), Some("20, France".to_string()));
        assert_eq!(q("", ""), None);
    }
}
