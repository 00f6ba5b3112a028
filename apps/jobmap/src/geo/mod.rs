// Location resolution: commune index, department centroids, remote geocoding,
// and the tiered resolver that ties them together.

pub mod cache;
pub mod city_index;
pub mod departments;
pub mod distance;
pub mod geocoder;
pub mod normalize;
pub mod resolver;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A point in degrees, latitude first. Serialized as `[lat, lon]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Builds coordinates from a GeoJSON-style `[lon, lat]` pair.
    pub fn from_lon_lat(pair: [f64; 2]) -> Self {
        Self {
            lat: pair[1],
            lon: pair[0],
        }
    }
}

impl From<[f64; 2]> for Coordinates {
    fn from(pair: [f64; 2]) -> Self {
        Self::new(pair[0], pair[1])
    }
}

impl From<Coordinates> for [f64; 2] {
    fn from(c: Coordinates) -> Self {
        [c.lat, c.lon]
    }
}

#[derive(Debug, Error)]
pub enum GeoError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} returned status {status}")]
    Status { service: &'static str, status: u16 },

    #[error("Invalid coordinates in response: {0}")]
    InvalidCoordinates(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinates_serialize_lat_first() {
        let c = Coordinates::new(48.85, 2.35);
        assert_eq!(serde_json::to_string(&c).unwrap(), "[48.85,2.35]");
        let back: Coordinates = serde_json::from_str("[48.85,2.35]").unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn test_from_lon_lat_swaps() {
        let c = Coordinates::from_lon_lat([2.35, 48.85]);
        assert_eq!(c.lat, 48.85);
        assert_eq!(c.lon, 2.35);
    }
}
