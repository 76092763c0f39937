use crate::models::{BoundingBox, Coordinate};

/// Earth's radius in kilometers
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Relative widening applied to the radius before computing box edges
const RADIUS_MARGIN: f64 = 1e-9;

/// Degrees added to every box edge to absorb rounding in the conversions
const EDGE_MARGIN_DEG: f64 = 1e-9;

/// Calculate the Haversine distance between two coordinates in kilometers
///
/// The intermediate `a` term is clamped to `[0, 1]` so identical and
/// antipodal points never feed `asin` a value outside its domain.
#[inline]
pub fn haversine_distance(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lon1 = a.longitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let lon2 = b.longitude.to_radians();

    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * h.clamp(0.0, 1.0).sqrt().asin();

    c * EARTH_RADIUS_KM
}

/// Calculate a bounding box around a center point
///
/// The box is conservative: every point within `radius_km` of `center` lies
/// inside it, including points exactly `radius_km` away. Longitude is left
/// unconstrained when the circle reaches a pole, and the range wraps when it
/// crosses the antimeridian.
pub fn calculate_bounding_box(center: Coordinate, radius_km: f64) -> BoundingBox {
    if radius_km.is_nan() || radius_km < 0.0 || !center.is_valid() {
        return BoundingBox::WORLD;
    }

    let angular = radius_km * (1.0 + RADIUS_MARGIN) / EARTH_RADIUS_KM;
    let lat = center.latitude.to_radians();
    let lon = center.longitude.to_radians();

    let min_lat = (lat - angular).to_degrees() - EDGE_MARGIN_DEG;
    let max_lat = (lat + angular).to_degrees() + EDGE_MARGIN_DEG;

    if min_lat <= -90.0 || max_lat >= 90.0 {
        return BoundingBox {
            min_lat: min_lat.max(-90.0),
            max_lat: max_lat.min(90.0),
            ..BoundingBox::WORLD
        };
    }

    let ratio = angular.sin() / lat.cos();
    if ratio >= 1.0 {
        return BoundingBox {
            min_lat,
            max_lat,
            ..BoundingBox::WORLD
        };
    }

    let lon_delta = ratio.asin();
    let mut min_lon = (lon - lon_delta).to_degrees() - EDGE_MARGIN_DEG;
    let mut max_lon = (lon + lon_delta).to_degrees() + EDGE_MARGIN_DEG;
    let mut wraps_antimeridian = false;

    if min_lon < -180.0 {
        min_lon += 360.0;
        wraps_antimeridian = true;
    }
    if max_lon > 180.0 {
        max_lon -= 360.0;
        wraps_antimeridian = true;
    }

    BoundingBox {
        min_lat,
        max_lat,
        min_lon,
        max_lon,
        wraps_antimeridian,
    }
}

/// Check if a point is within a bounding box
#[inline]
pub fn is_within_bounding_box(point: Coordinate, bbox: &BoundingBox) -> bool {
    if point.latitude < bbox.min_lat || point.latitude > bbox.max_lat {
        return false;
    }

    if bbox.wraps_antimeridian {
        point.longitude >= bbox.min_lon || point.longitude <= bbox.max_lon
    } else {
        point.longitude >= bbox.min_lon && point.longitude <= bbox.max_lon
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_distance() {
        // London to Paris is approximately 344 km
        let london = Coordinate::new(51.5074, -0.1278);
        let paris = Coordinate::new(48.8566, 2.3522);

        let distance = haversine_distance(london, paris);
        assert!((distance - 344.0).abs() < 10.0, "Distance should be ~344km, got {}", distance);
    }

    #[test]
    fn test_one_degree_at_equator() {
        let distance = haversine_distance(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 1.0));
        assert!((distance - 111.19).abs() < 0.01, "got {}", distance);
    }

    #[test]
    fn test_identical_points() {
        let p = Coordinate::new(-33.8688, 151.2093);
        assert_eq!(haversine_distance(p, p), 0.0);
    }

    #[test]
    fn test_antipodal_points_are_finite() {
        let distance = haversine_distance(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 180.0));
        assert!(distance.is_finite());
        assert!((distance - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);

        let poles = haversine_distance(Coordinate::new(90.0, 0.0), Coordinate::new(-90.0, 0.0));
        assert!((poles - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);
    }

    #[test]
    fn test_bounding_box() {
        let center = Coordinate::new(40.7128, -74.0060);
        let bbox = calculate_bounding_box(center, 10.0);

        assert!(bbox.min_lat < 40.7128);
        assert!(bbox.max_lat > 40.7128);
        assert!(bbox.min_lon < -74.0060);
        assert!(bbox.max_lon > -74.0060);
        assert!(!bbox.wraps_antimeridian);

        // 20km / ~111km per degree
        let lat_span = bbox.max_lat - bbox.min_lat;
        assert!((lat_span - 0.18).abs() < 0.02, "Lat span should be ~0.18 degrees");
    }

    #[test]
    fn test_point_within_bbox() {
        let bbox = calculate_bounding_box(Coordinate::new(40.7128, -74.0060), 10.0);

        assert!(is_within_bounding_box(Coordinate::new(40.7128, -74.0060), &bbox));
        assert!(is_within_bounding_box(Coordinate::new(40.71, -74.0), &bbox));
        assert!(!is_within_bounding_box(Coordinate::new(50.0, -80.0), &bbox));
    }

    #[test]
    fn test_bbox_wraps_antimeridian() {
        let center = Coordinate::new(0.0, 179.9);
        let bbox = calculate_bounding_box(center, 50.0);

        assert!(bbox.wraps_antimeridian);
        let across = Coordinate::new(0.0, -179.9);
        assert!(haversine_distance(center, across) < 50.0);
        assert!(is_within_bounding_box(across, &bbox));
        assert!(!is_within_bounding_box(Coordinate::new(0.0, 0.0), &bbox));
    }

    #[test]
    fn test_bbox_near_pole_spans_all_longitudes() {
        let center = Coordinate::new(89.9, 0.0);
        let bbox = calculate_bounding_box(center, 50.0);

        assert_eq!(bbox.min_lon, -180.0);
        assert_eq!(bbox.max_lon, 180.0);
        assert_eq!(bbox.max_lat, 90.0);

        let other_side = Coordinate::new(89.9, 180.0);
        assert!(haversine_distance(center, other_side) < 50.0);
        assert!(is_within_bounding_box(other_side, &bbox));
    }

    #[test]
    fn test_bbox_contains_edge_of_circle_at_high_latitude() {
        // The widest point of the circle sits poleward of the center latitude
        let center = Coordinate::new(60.0, 10.0);
        let radius = 500.0;
        let bbox = calculate_bounding_box(center, radius);

        for step in 0..360 {
            let bearing = (step as f64).to_radians();
            let edge = destination(center, bearing, radius * 0.999);
            assert!(is_within_bounding_box(edge, &bbox), "missed {:?}", edge);
        }
    }

    #[test]
    fn test_bbox_contains_point_exactly_at_radius() {
        let pairs = [
            ((63.5, 0.0), (63.51, 0.0)),
            ((63.51, 0.0), (63.5, 0.0)),
            ((0.0, 0.0), (0.0, 1.0)),
            ((0.0, 0.0), (-1.0, 0.0)),
            ((45.0, 7.0), (45.0, 7.25)),
            ((-33.8688, 151.2093), (-33.9, 151.3)),
            ((10.0, 179.99), (10.0, -179.99)),
        ];

        for ((clat, clon), (plat, plon)) in pairs {
            let center = Coordinate::new(clat, clon);
            let point = Coordinate::new(plat, plon);
            let radius = haversine_distance(center, point);
            let bbox = calculate_bounding_box(center, radius);
            assert!(is_within_bounding_box(point, &bbox), "{:?} -> {:?}", center, point);
        }
    }

    #[test]
    fn test_zero_radius_box_contains_center() {
        let center = Coordinate::new(63.5, 0.1);
        let bbox = calculate_bounding_box(center, 0.0);
        assert!(is_within_bounding_box(center, &bbox));
    }

    #[test]
    fn test_invalid_input_gives_world_box() {
        assert_eq!(calculate_bounding_box(Coordinate::new(0.0, 0.0), -1.0), BoundingBox::WORLD);
        assert_eq!(calculate_bounding_box(Coordinate::new(f64::NAN, 0.0), 1.0), BoundingBox::WORLD);
    }

    fn destination(start: Coordinate, bearing: f64, distance_km: f64) -> Coordinate {
        let d = distance_km / EARTH_RADIUS_KM;
        let lat1 = start.latitude.to_radians();
        let lon1 = start.longitude.to_radians();
        let lat2 = (lat1.sin() * d.cos() + lat1.cos() * d.sin() * bearing.cos()).asin();
        let lon2 = lon1
            + (bearing.sin() * d.sin() * lat1.cos()).atan2(d.cos() - lat1.sin() * lat2.sin());
        Coordinate::new(lat2.to_degrees(), lon2.to_degrees())
    }
}
