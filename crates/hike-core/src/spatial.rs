//! Spatial math for grid layout and edge distances.

use crate::models::GeoPoint;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Meters per degree of longitude (fixed, not latitude-corrected).
pub const METERS_PER_DEG_LON: f64 = 111_699.0;

/// Meters per degree of latitude.
pub const METERS_PER_DEG_LAT: f64 = 111_000.0;

/// Great-circle distance in meters between two latitude/longitude pairs given
/// in degrees. The haversine term is clamped so antipodal inputs cannot push
/// `asin` out of its domain.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let half_dphi = (phi2 - phi1) / 2.0;
    let half_dlambda = (lon2 - lon1).to_radians() / 2.0;
    let h = half_dphi.sin().powi(2) + phi1.cos() * phi2.cos() * half_dlambda.sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

/// Great-circle distance between two [`GeoPoint`]s in meters.
pub fn surface_distance(a: &GeoPoint, b: &GeoPoint) -> f64 {
    haversine_distance(a.lat, a.lon, b.lat, b.lon)
}

/// Convert an east/west span in meters to degrees of longitude.
pub fn meters_to_lon(meters: f64, meters_per_deg_lon: f64) -> f64 {
    meters / meters_per_deg_lon.max(1e-9)
}

/// Convert a north/south span in meters to degrees of latitude.
pub fn meters_to_lat(meters: f64, meters_per_deg_lat: f64) -> f64 {
    meters / meters_per_deg_lat.max(1e-9)
}
