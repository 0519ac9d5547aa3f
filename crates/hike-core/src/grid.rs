//! Regular terrain grid and its adjacency graph.
//!
//! # Layout
//!
//! A [`GridLayout`] places one node every `spacing_m` meters across a
//! bounding box, converting the spacing to degree steps with fixed
//! meters-per-degree ratios. Columns advance eastward from the west edge,
//! rows advance northward from the south edge. Nodes are stored column by
//! column, so the slot of `(col, row)` is `col * rows + row`.
//!
//! # Linking
//!
//! Nodes are visited in storage order. Each new node links back to the
//! already-built neighbours to its west, south-west, north-west and south,
//! so every neighbouring pair is linked exactly once and both directions
//! are emitted together. Distance is symmetric; calorie cost is not.
//!
//! # Anchors
//!
//! The anchor for an arbitrary point is picked per axis: the column whose
//! longitude is closest and the row whose latitude is closest. Because the
//! grid is a full lattice this is also the nearest node in degree space.

use serde::{Deserialize, Serialize};

use crate::cost::CostModel;
use crate::error::{RouteError, RouteResult};
use crate::models::{BoundingBox, Edge, GeoPoint, GridNode, NodeId};
use crate::spatial::{meters_to_lat, meters_to_lon, METERS_PER_DEG_LAT, METERS_PER_DEG_LON};

/// Grid construction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridOptions {
    pub spacing_m: f64,
    pub meters_per_deg_lon: f64,
    pub meters_per_deg_lat: f64,
    pub max_nodes: usize,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            spacing_m: 10.0,
            meters_per_deg_lon: METERS_PER_DEG_LON,
            meters_per_deg_lat: METERS_PER_DEG_LAT,
            max_nodes: 250_000,
        }
    }
}

/// Node placement for one grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridLayout {
    /// South-west corner, position of node `0/0`.
    pub origin: GeoPoint,
    pub lon_step_deg: f64,
    pub lat_step_deg: f64,
    pub cols: usize,
    pub rows: usize,
}

/// Per-node input gathered from the providers, in layout order.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSample {
    pub elevation_m: f64,
    pub terrain: Option<String>,
}

impl NodeSample {
    pub fn elevation(elevation_m: f64) -> Self {
        Self {
            elevation_m,
            terrain: None,
        }
    }
}

impl GridLayout {
    pub fn new(origin: GeoPoint, lon_step_deg: f64, lat_step_deg: f64, cols: usize, rows: usize) -> Self {
        Self {
            origin,
            lon_step_deg,
            lat_step_deg,
            cols,
            rows,
        }
    }

    /// Lay out a grid across `bbox`.
    ///
    /// One column per longitude step strictly inside the west-to-east extent,
    /// one row per latitude step strictly inside the south-to-north extent.
    pub fn covering(bbox: &BoundingBox, options: &GridOptions) -> RouteResult<Self> {
        if !(options.spacing_m.is_finite() && options.spacing_m > 0.0) {
            return Err(RouteError::InvalidInput(format!(
                "grid spacing must be positive, got {}",
                options.spacing_m
            )));
        }
        if !(bbox.lon_span() > 0.0 && bbox.lat_span() > 0.0) {
            return Err(RouteError::InvalidInput(format!(
                "bounding box has zero area: {:?}",
                bbox
            )));
        }

        let lon_step_deg = meters_to_lon(options.spacing_m, options.meters_per_deg_lon);
        let lat_step_deg = meters_to_lat(options.spacing_m, options.meters_per_deg_lat);
        let cols = steps_within(bbox.lon_span(), lon_step_deg);
        let rows = steps_within(bbox.lat_span(), lat_step_deg);

        let total = cols.saturating_mul(rows);
        if total > options.max_nodes {
            return Err(RouteError::GridConstruction(format!(
                "grid of {}x{} nodes exceeds the limit of {}",
                cols, rows, options.max_nodes
            )));
        }

        Ok(Self {
            origin: bbox.bottom_left,
            lon_step_deg,
            lat_step_deg,
            cols,
            rows,
        })
    }

    pub fn node_count(&self) -> usize {
        self.cols.saturating_mul(self.rows)
    }

    pub fn slot(&self, id: NodeId) -> Option<usize> {
        let col = id.col as usize;
        let row = id.row as usize;
        if col >= self.cols || row >= self.rows {
            return None;
        }
        Some(col * self.rows + row)
    }

    fn id_at(&self, slot: usize) -> NodeId {
        NodeId::new((slot / self.rows) as u32, (slot % self.rows) as u32)
    }

    pub fn lon_at(&self, col: usize) -> f64 {
        self.origin.lon + col as f64 * self.lon_step_deg
    }

    pub fn lat_at(&self, row: usize) -> f64 {
        self.origin.lat + row as f64 * self.lat_step_deg
    }

    pub fn position(&self, id: NodeId) -> GeoPoint {
        GeoPoint::new(self.lon_at(id.col as usize), self.lat_at(id.row as usize))
    }

    /// All node positions in storage order.
    pub fn positions(&self) -> Vec<GeoPoint> {
        let mut out = Vec::with_capacity(self.node_count());
        for col in 0..self.cols {
            let lon = self.lon_at(col);
            for row in 0..self.rows {
                out.push(GeoPoint::new(lon, self.lat_at(row)));
            }
        }
        out
    }

    /// Grid node nearest to `point`, chosen independently per axis.
    pub fn anchor(&self, point: &GeoPoint) -> RouteResult<NodeId> {
        if self.cols == 0 || self.rows == 0 || !point.is_finite() {
            return Err(RouteError::NodeResolution(*point));
        }
        let col = nearest_index(self.cols, |col| (point.lon - self.lon_at(col)).abs());
        let row = nearest_index(self.rows, |row| (point.lat - self.lat_at(row)).abs());
        match (col, row) {
            (Some(col), Some(row)) => Ok(NodeId::new(col as u32, row as u32)),
            _ => Err(RouteError::NodeResolution(*point)),
        }
    }
}

/// Number of `k >= 0` with `k * step < span`.
fn steps_within(span: f64, step: f64) -> usize {
    let count = (span / step).ceil();
    if count.is_finite() && count >= 1.0 {
        count as usize
    } else {
        1
    }
}

/// First index with the strictly smallest offset.
fn nearest_index(len: usize, offset: impl Fn(usize) -> f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for idx in 0..len {
        let value = offset(idx);
        if !value.is_finite() {
            continue;
        }
        match best {
            Some((_, best_value)) if value >= best_value => {}
            _ => best = Some((idx, value)),
        }
    }
    best.map(|(idx, _)| idx)
}

/// Immutable terrain graph. Safe to share across concurrent route queries.
#[derive(Debug, Clone)]
pub struct GeoGraph {
    pub(crate) layout: GridLayout,
    pub(crate) nodes: Vec<GridNode>,
    pub(crate) adjacency: Vec<Vec<Edge>>,
}

impl GeoGraph {
    /// Build the graph for `layout` from per-node samples in storage order.
    pub fn assemble(layout: GridLayout, samples: Vec<NodeSample>, cost: &CostModel) -> RouteResult<Self> {
        let count = layout.node_count();
        if count == 0 {
            return Err(RouteError::GridConstruction("grid has no nodes".to_string()));
        }
        if samples.len() != count {
            return Err(RouteError::GridConstruction(format!(
                "expected {} node samples, got {}",
                count,
                samples.len()
            )));
        }

        let mut graph = GeoGraph {
            layout,
            nodes: Vec::with_capacity(count),
            adjacency: Vec::with_capacity(count),
        };

        for (slot, sample) in samples.into_iter().enumerate() {
            let id = layout.id_at(slot);
            if !sample.elevation_m.is_finite() {
                return Err(RouteError::GridConstruction(format!(
                    "node {} has non-finite elevation {}",
                    id, sample.elevation_m
                )));
            }
            graph.nodes.push(GridNode {
                id,
                position: layout.position(id),
                elevation_m: sample.elevation_m,
                terrain: sample.terrain,
            });
            graph.adjacency.push(Vec::new());

            let col = id.col;
            let row = id.row;
            if col > 0 {
                graph.link(slot, NodeId::new(col - 1, row), cost)?;
                if (row as usize) + 1 < layout.rows {
                    graph.link(slot, NodeId::new(col - 1, row + 1), cost)?;
                }
                if row > 0 {
                    graph.link(slot, NodeId::new(col - 1, row - 1), cost)?;
                }
            }
            if row > 0 {
                graph.link(slot, NodeId::new(col, row - 1), cost)?;
            }
        }

        Ok(graph)
    }

    /// Link the newest node to an existing neighbour in both directions.
    fn link(&mut self, slot: usize, neighbour: NodeId, cost: &CostModel) -> RouteResult<()> {
        let other = self
            .layout
            .slot(neighbour)
            .filter(|&other| other < slot)
            .ok_or_else(|| {
                RouteError::GridConstruction(format!(
                    "neighbour {} of {} is not built yet",
                    neighbour, self.nodes[slot].id
                ))
            })?;

        let forward = cost.edge_cost(&self.nodes[slot], &self.nodes[other]);
        let backward = cost.edge_cost(&self.nodes[other], &self.nodes[slot]);
        let here = self.nodes[slot].id;

        self.adjacency[slot].push(Edge {
            from: here,
            to: neighbour,
            distance_m: forward.distance_m,
            calories_kcal: forward.calories_kcal,
            grade: forward.grade,
            grade_penalty: forward.grade_penalty,
        });
        self.adjacency[other].push(Edge {
            from: neighbour,
            to: here,
            distance_m: forward.distance_m,
            calories_kcal: backward.calories_kcal,
            grade: backward.grade,
            grade_penalty: backward.grade_penalty,
        });
        Ok(())
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GridNode> + '_ {
        self.nodes.iter()
    }

    pub fn node(&self, id: NodeId) -> Option<&GridNode> {
        self.layout.slot(id).map(|slot| &self.nodes[slot])
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.layout.slot(id).is_some()
    }

    /// Outgoing edges of `id`; empty for unknown nodes.
    pub fn edges(&self, id: NodeId) -> &[Edge] {
        match self.layout.slot(id) {
            Some(slot) => &self.adjacency[slot],
            None => &[],
        }
    }

    /// The edge walked from `from` directly to `to`, if the two are linked.
    pub fn edge(&self, from: NodeId, to: NodeId) -> Option<&Edge> {
        self.edges(from).iter().find(|edge| edge.to == to)
    }

    pub fn anchor(&self, point: &GeoPoint) -> RouteResult<NodeId> {
        self.layout.anchor(point)
    }
}
