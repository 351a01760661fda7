use super::domain::Coordinates;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two points using the haversine formula.
pub fn haversine_km(from: Coordinates, to: Coordinates) -> f64 {
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lng = (to.lng - from.lng).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + from.lat.to_radians().cos() * to.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);

    EARTH_RADIUS_KM * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, lng: f64) -> Coordinates {
        Coordinates { lat, lng }
    }

    #[test]
    fn identical_points_are_zero_apart() {
        let colombo = point(6.9271, 79.8612);
        assert_eq!(haversine_km(colombo, colombo), 0.0);
    }

    #[test]
    fn colombo_to_kandy_matches_reference_distance() {
        let distance = haversine_km(point(6.9271, 79.8612), point(7.2906, 80.6337));
        assert!((distance - 94.335).abs() < 0.01, "got {distance}");
    }

    #[test]
    fn distance_is_symmetric() {
        let pairs = [
            (point(6.9, 80.7), point(7.29, 80.63)),
            (point(-33.86, 151.21), point(51.5, -0.12)),
            (point(89.9, 179.9), point(-89.9, -179.9)),
        ];
        for (a, b) in pairs {
            assert!((haversine_km(a, b) - haversine_km(b, a)).abs() < 1e-6);
        }
    }

    #[test]
    fn antipodal_points_are_half_circumference_apart() {
        let distance = haversine_km(point(0.0, 0.0), point(0.0, 180.0));
        assert!((distance - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);
    }
}
