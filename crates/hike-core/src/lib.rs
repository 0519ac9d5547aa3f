pub mod bbox;
pub mod cost;
pub mod error;
pub mod grid;
pub mod heap;
pub mod models;
pub mod planner;
pub mod spatial;

pub use bbox::bounding_box;
pub use cost::{CostModel, EdgeCost};
pub use error::{HeapError, ProviderError, RouteError, RouteResult};
pub use grid::{GeoGraph, GridLayout, GridOptions, NodeSample};
pub use heap::MinHeap;
pub use models::{
    BoundingBox, Edge, ElevationUnit, GeoPoint, GridNode, NodeId, PointKey, Route, FEET_PER_METER,
};
pub use planner::{shortest_paths, shortest_paths_in, RoutePlanner, SearchDirection, SearchTree};
pub use spatial::{haversine_distance, surface_distance};
