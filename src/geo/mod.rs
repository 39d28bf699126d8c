use crate::error::AppError;
use crate::models::station::GeoPoint;

const EARTH_RADIUS_KM: f64 = 6_371.0;

/// A worker drifting less than this keeps their cached station.
pub const REASSIGN_THRESHOLD_KM: f64 = 0.5;

/// Great-circle distance in kilometres, rounded to 2 decimals.
/// Non-finite coordinates are a caller error.
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> Result<f64, AppError> {
    validate(a)?;
    validate(b)?;

    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    let haversine = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng;
    let central_angle = 2.0 * haversine.sqrt().asin();

    Ok(round2(EARTH_RADIUS_KM * central_angle))
}

pub fn moved_beyond(a: GeoPoint, b: GeoPoint, threshold_km: f64) -> Result<bool, AppError> {
    Ok(distance_km(a, b)? > threshold_km)
}

/// Pairs each item with its distance from `origin` and sorts nearest-first.
/// The sort is stable: ties keep their input order.
pub fn sort_by_distance<T>(
    origin: GeoPoint,
    items: Vec<(T, GeoPoint)>,
) -> Result<Vec<(T, f64)>, AppError> {
    let mut with_distance = Vec::with_capacity(items.len());
    for (item, point) in items {
        let d = distance_km(origin, point)?;
        with_distance.push((item, d));
    }
    with_distance.sort_by(|a, b| a.1.total_cmp(&b.1));
    Ok(with_distance)
}

pub fn within_radius<T>(sorted: Vec<(T, f64)>, max_km: f64) -> Vec<(T, f64)> {
    sorted.into_iter().filter(|(_, d)| *d <= max_km).collect()
}

pub fn validate(p: GeoPoint) -> Result<(), AppError> {
    if !p.lat.is_finite() || !p.lng.is_finite() {
        return Err(AppError::BadRequest(format!(
            "coordinates must be finite, got ({}, {})",
            p.lat, p.lng
        )));
    }
    Ok(())
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::{distance_km, moved_beyond, sort_by_distance, within_radius};
    use crate::models::station::GeoPoint;

    #[test]
    fn zero_distance_for_same_point() {
        let p = GeoPoint { lat: 28.6139, lng: 77.2090 };
        assert_eq!(distance_km(p, p).unwrap(), 0.0);
    }

    #[test]
    fn london_to_paris_is_around_343_km() {
        let london = GeoPoint { lat: 51.5074, lng: -0.1278 };
        let paris = GeoPoint { lat: 48.8566, lng: 2.3522 };
        let distance = distance_km(london, paris).unwrap();
        assert!((distance - 343.0).abs() < 5.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = GeoPoint { lat: 19.0760, lng: 72.8777 };
        let b = GeoPoint { lat: 18.5204, lng: 73.8567 };
        assert_eq!(distance_km(a, b).unwrap(), distance_km(b, a).unwrap());
    }

    #[test]
    fn non_finite_coordinates_are_rejected() {
        let good = GeoPoint { lat: 12.97, lng: 77.59 };
        let bad = GeoPoint { lat: f64::NAN, lng: 77.59 };
        assert!(distance_km(good, bad).is_err());

        let inf = GeoPoint { lat: 12.97, lng: f64::INFINITY };
        assert!(distance_km(inf, good).is_err());
    }

    #[test]
    fn moved_beyond_uses_threshold() {
        let origin = GeoPoint { lat: 28.6139, lng: 77.2090 };
        // ~0.11 km north.
        let nearby = GeoPoint { lat: 28.6149, lng: 77.2090 };
        // ~1.1 km north.
        let far = GeoPoint { lat: 28.6239, lng: 77.2090 };

        assert!(!moved_beyond(origin, nearby, 0.5).unwrap());
        assert!(moved_beyond(origin, far, 0.5).unwrap());
    }

    #[test]
    fn sorting_is_nearest_first_and_radius_filters() {
        let origin = GeoPoint { lat: 28.6139, lng: 77.2090 };
        let near = GeoPoint { lat: 28.6239, lng: 77.2090 };
        let far = GeoPoint { lat: 28.8139, lng: 77.2090 };

        let sorted = sort_by_distance(origin, vec![("far", far), ("near", near)]).unwrap();
        assert_eq!(sorted[0].0, "near");
        assert_eq!(sorted[1].0, "far");

        let in_radius = within_radius(sorted, 5.0);
        assert_eq!(in_radius.len(), 1);
        assert_eq!(in_radius[0].0, "near");
    }
}
