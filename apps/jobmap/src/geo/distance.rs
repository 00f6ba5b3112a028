use crate::geo::Coordinates;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometres (haversine formula).
pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_point_is_zero() {
        let p = Coordinates::new(45.76, 4.84);
        assert!(haversine_km(p, p).abs() < 1e-9);
    }

    #[test]
    fn test_paris_lyon() {
        let paris = Coordinates::new(48.8566, 2.3522);
        let lyon = Coordinates::new(45.7640, 4.8357);
        let d = haversine_km(paris, lyon);
        assert!((d - 392.0).abs() < 5.0, "got {d}");
    }

    #[test]
    fn test_symmetric() {
        let a = Coordinates::new(43.6, 1.44);
        let b = Coordinates::new(47.22, -1.55);
        assert!((haversine_km(a, b) - haversine_km(b, a)).abs() < 1e-9);
    }
}
