//! Bounding box derivation from a pair of route endpoints.
//!
//! Two endpoints that are nearly aligned on one axis would produce a thin
//! sliver of a search area. The shorter axis is padded on both sides by a
//! third of the longer axis extent so the grid has room to detour.

use crate::error::{RouteError, RouteResult};
use crate::models::{BoundingBox, GeoPoint};

/// Compute the search rectangle for a route between `p1` and `p2`.
pub fn bounding_box(p1: &GeoPoint, p2: &GeoPoint) -> RouteResult<BoundingBox> {
    if !p1.is_finite() || !p2.is_finite() {
        return Err(RouteError::InvalidInput(format!(
            "endpoints must be finite: {} -> {}",
            p1, p2
        )));
    }

    let dx = p2.lon - p1.lon;
    let dy = p2.lat - p1.lat;
    if dx == 0.0 && dy == 0.0 {
        return Err(RouteError::InvalidInput(format!(
            "start and end coincide at {}",
            p1
        )));
    }

    let mut min_lon = p1.lon.min(p2.lon);
    let mut max_lon = p1.lon.max(p2.lon);
    let mut min_lat = p1.lat.min(p2.lat);
    let mut max_lat = p1.lat.max(p2.lat);

    let (pad_lon, pad_lat) = if dy == 0.0 {
        // Horizontal line, slope 0.
        (0.0, dx.abs() / 3.0)
    } else if dx == 0.0 {
        // Vertical line, slope unbounded.
        (dy.abs() / 3.0, 0.0)
    } else {
        let slope = (dy / dx).abs();
        if slope < 1.0 {
            (0.0, (max_lat - min_lat) / 3.0 / slope)
        } else if slope > 1.0 {
            ((max_lon - min_lon) / 3.0 * slope, 0.0)
        } else {
            (0.0, 0.0)
        }
    };

    min_lon -= pad_lon;
    max_lon += pad_lon;
    min_lat -= pad_lat;
    max_lat += pad_lat;

    Ok(BoundingBox {
        top_left: GeoPoint::new(min_lon, max_lat),
        top_right: GeoPoint::new(max_lon, max_lat),
        bottom_left: GeoPoint::new(min_lon, min_lat),
        bottom_right: GeoPoint::new(max_lon, min_lat),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn assert_well_formed(bbox: &BoundingBox, p1: &GeoPoint, p2: &GeoPoint) {
        assert!(bbox.contains(p1), "{:?} should contain {}", bbox, p1);
        assert!(bbox.contains(p2), "{:?} should contain {}", bbox, p2);
        assert!(bbox.top_left.lon <= bbox.top_right.lon);
        assert!(bbox.bottom_left.lat <= bbox.top_left.lat);
        assert_eq!(bbox.top_left.lon, bbox.bottom_left.lon);
        assert_eq!(bbox.top_right.lon, bbox.bottom_right.lon);
        assert_eq!(bbox.top_left.lat, bbox.top_right.lat);
        assert_eq!(bbox.bottom_left.lat, bbox.bottom_right.lat);
        assert!(bbox.lon_span().is_finite() && bbox.lat_span().is_finite());
    }

    #[test]
    fn shallow_pair_pads_latitude() {
        let p1 = GeoPoint::new(-105.30, 40.000);
        let p2 = GeoPoint::new(-105.27, 40.003);
        let bbox = bounding_box(&p1, &p2).unwrap();
        assert_well_formed(&bbox, &p1, &p2);
        // Pad equals a third of the longitude extent on each side.
        let expected_lat_span = 0.003 + 2.0 * 0.03 / 3.0;
        assert!((bbox.lat_span() - expected_lat_span).abs() < 1e-9);
        assert!((bbox.lon_span() - 0.03).abs() < 1e-9);
    }

    #[test]
    fn steep_pair_pads_longitude() {
        let p1 = GeoPoint::new(-105.270, 40.00);
        let p2 = GeoPoint::new(-105.272, 40.06);
        let bbox = bounding_box(&p1, &p2).unwrap();
        assert_well_formed(&bbox, &p1, &p2);
        let expected_lon_span = 0.002 + 2.0 * 0.06 / 3.0;
        assert!((bbox.lon_span() - expected_lon_span).abs() < 1e-9);
    }

    #[test]
    fn horizontal_pair_does_not_produce_nan() {
        let p1 = GeoPoint::new(-105.30, 40.0);
        let p2 = GeoPoint::new(-105.24, 40.0);
        let bbox = bounding_box(&p1, &p2).unwrap();
        assert_well_formed(&bbox, &p1, &p2);
        assert!((bbox.lat_span() - 0.04).abs() < 1e-9);
    }

    #[test]
    fn vertical_pair_does_not_produce_nan() {
        let p1 = GeoPoint::new(-105.27, 40.03);
        let p2 = GeoPoint::new(-105.27, 40.00);
        let bbox = bounding_box(&p1, &p2).unwrap();
        assert_well_formed(&bbox, &p1, &p2);
        assert!((bbox.lon_span() - 0.02).abs() < 1e-9);
    }

    #[test]
    fn diagonal_pair_is_left_square() {
        let p1 = GeoPoint::new(0.0, 0.0);
        let p2 = GeoPoint::new(0.5, 0.5);
        let bbox = bounding_box(&p1, &p2).unwrap();
        assert_well_formed(&bbox, &p1, &p2);
        assert_eq!(bbox.lon_span(), 0.5);
        assert_eq!(bbox.lat_span(), 0.5);
    }

    #[test]
    fn coincident_points_are_rejected() {
        let p = GeoPoint::new(-105.27, 40.01);
        assert!(matches!(
            bounding_box(&p, &p),
            Err(RouteError::InvalidInput(_))
        ));
    }

    #[test]
    fn non_finite_points_are_rejected() {
        let p1 = GeoPoint::new(f64::NAN, 40.0);
        let p2 = GeoPoint::new(-105.0, 40.0);
        assert!(matches!(
            bounding_box(&p1, &p2),
            Err(RouteError::InvalidInput(_))
        ));
    }

    #[test]
    fn arbitrary_pairs_stay_well_formed() {
        let pairs = [
            ((10.0, 10.0), (9.0, 11.0)),
            ((-1.0, 0.5), (2.0, 0.25)),
            ((179.0, -45.0), (178.5, -44.0)),
            ((0.001, 0.0), (0.0, 0.002)),
        ];
        for ((x1, y1), (x2, y2)) in pairs {
            let p1 = GeoPoint::new(x1, y1);
            let p2 = GeoPoint::new(x2, y2);
            let bbox = bounding_box(&p1, &p2).unwrap();
            assert_well_formed(&bbox, &p1, &p2);
        }
    }

    #[test]
    fn random_pairs_pad_the_shorter_axis() {
        let mut rng = StdRng::seed_from_u64(0x6b1e);
        for _ in 0..5000 {
            let p1 = GeoPoint::new(rng.random_range(-179.0..179.0), rng.random_range(-80.0..80.0));
            let p2 = GeoPoint::new(
                p1.lon + rng.random_range(-0.5..0.5),
                p1.lat + rng.random_range(-0.5..0.5),
            );
            let (dx, dy) = ((p2.lon - p1.lon).abs(), (p2.lat - p1.lat).abs());
            if dx == dy {
                continue;
            }
            let bbox = bounding_box(&p1, &p2).unwrap();
            assert_well_formed(&bbox, &p1, &p2);

            let (long, short, long_span, short_span) = if dx > dy {
                (dx, dy, bbox.lon_span(), bbox.lat_span())
            } else {
                (dy, dx, bbox.lat_span(), bbox.lon_span())
            };
            let tolerance = 1e-9 * (1.0 + long);
            assert!((long_span - long).abs() < tolerance, "{} -> {}: {:?}", p1, p2, bbox);
            assert!(
                (short_span - (short + 2.0 * long / 3.0)).abs() < tolerance,
                "{} -> {}: {:?}",
                p1,
                p2,
                bbox
            );
        }
    }
}
