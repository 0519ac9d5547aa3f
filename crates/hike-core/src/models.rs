//! Core data models for terrain routing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Feet per meter, used when a provider reports elevations in feet.
pub const FEET_PER_METER: f64 = 3.2808;

/// Quantization applied to coordinates when keying provider results.
const POINT_KEY_SCALE: f64 = 1e7;

/// A geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

impl GeoPoint {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    pub fn is_finite(&self) -> bool {
        self.lon.is_finite() && self.lat.is_finite()
    }

    /// Stable hashable key for this position, quantized to 1e-7 degrees.
    pub fn key(&self) -> PointKey {
        PointKey {
            lon_e7: (self.lon * POINT_KEY_SCALE).round() as i64,
            lat_e7: (self.lat * POINT_KEY_SCALE).round() as i64,
        }
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lon, self.lat)
    }
}

/// Hashable identity of a sampled position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointKey {
    pub lon_e7: i64,
    pub lat_e7: i64,
}

/// Axis-aligned rectangle in degree space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub top_left: GeoPoint,
    pub top_right: GeoPoint,
    pub bottom_left: GeoPoint,
    pub bottom_right: GeoPoint,
}

impl BoundingBox {
    pub fn min_lon(&self) -> f64 {
        self.bottom_left.lon
    }

    pub fn max_lon(&self) -> f64 {
        self.top_right.lon
    }

    pub fn min_lat(&self) -> f64 {
        self.bottom_left.lat
    }

    pub fn max_lat(&self) -> f64 {
        self.top_right.lat
    }

    pub fn lon_span(&self) -> f64 {
        self.max_lon() - self.min_lon()
    }

    pub fn lat_span(&self) -> f64 {
        self.max_lat() - self.min_lat()
    }

    pub fn contains(&self, point: &GeoPoint) -> bool {
        point.lon >= self.min_lon()
            && point.lon <= self.max_lon()
            && point.lat >= self.min_lat()
            && point.lat <= self.max_lat()
    }
}

/// Unit an elevation provider reports in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElevationUnit {
    #[default]
    Meters,
    Feet,
}

impl ElevationUnit {
    pub fn to_meters(self, value: f64) -> f64 {
        match self {
            ElevationUnit::Meters => value,
            ElevationUnit::Feet => value / FEET_PER_METER,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "m" | "meter" | "meters" | "metres" => Some(ElevationUnit::Meters),
            "ft" | "foot" | "feet" => Some(ElevationUnit::Feet),
            _ => None,
        }
    }
}

/// Grid cell identity: column counts eastward, row counts northward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId {
    pub col: u32,
    pub row: u32,
}

impl NodeId {
    pub fn new(col: u32, row: u32) -> Self {
        Self { col, row }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.col, self.row)
    }
}

/// A positioned, elevation-tagged grid vertex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridNode {
    pub id: NodeId,
    pub position: GeoPoint,
    /// Elevation in meters.
    pub elevation_m: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terrain: Option<String>,
}

/// Directed edge between two grid nodes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    pub distance_m: f64,
    pub calories_kcal: f64,
    /// Signed rise over run in the direction of travel.
    pub grade: f64,
    pub grade_penalty: f64,
}

impl Edge {
    /// Search weight of this edge.
    pub fn weight(&self) -> f64 {
        self.calories_kcal * self.grade_penalty
    }
}

/// Planned walking route, always oriented from the caller's start to end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub path: Vec<GeoPoint>,
    pub nodes: Vec<NodeId>,
    pub distance_m: f64,
    pub calories_kcal: f64,
    pub eta_secs: f64,
    pub elevation_delta_m: f64,
}
