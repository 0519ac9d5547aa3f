//! Async terrain grid construction.
//!
//! Endpoints become a bounding box, the box becomes a node layout, every node
//! position is sent to the elevation provider (and the terrain provider, when
//! one is attached), and the samples are assembled into an immutable
//! [`GeoGraph`]. Any provider failure aborts the build.

use std::time::{Duration, Instant};

use hike_core::{
    bounding_box, BoundingBox, CostModel, GeoGraph, GeoPoint, GridLayout, GridOptions, NodeId,
    NodeSample, Route, RoutePlanner, RouteResult,
};
use tokio::sync::broadcast;

use crate::fetch::{fetch_elevations, fetch_terrain, FetchOptions};
use crate::provider::{ElevationProvider, NoTerrain, TerrainProvider};

/// Time spent in each build phase.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BuildTimings {
    pub bounding_box: Duration,
    pub elevation_fetch: Duration,
    pub grid_build: Duration,
}

/// A finished grid together with the anchors of the endpoints it was built for.
#[derive(Debug, Clone)]
pub struct BuiltGrid {
    pub graph: GeoGraph,
    pub bounding_box: BoundingBox,
    pub start: GeoPoint,
    pub end: GeoPoint,
    pub start_anchor: NodeId,
    pub end_anchor: NodeId,
    pub cost: CostModel,
    pub timings: BuildTimings,
}

impl BuiltGrid {
    /// Plan between the endpoints this grid was built for.
    pub fn route(&self) -> RouteResult<Route> {
        RoutePlanner::new(&self.graph, &self.cost).route_between(
            self.start,
            self.end,
            self.start_anchor,
            self.end_anchor,
        )
    }

    /// Plan between any two points covered by this grid.
    pub fn route_between(&self, start: GeoPoint, end: GeoPoint) -> RouteResult<Route> {
        RoutePlanner::new(&self.graph, &self.cost).route(start, end)
    }
}

pub struct GridBuilder<'p, P, T = NoTerrain> {
    elevation: &'p P,
    terrain: Option<&'p T>,
    grid: GridOptions,
    cost: CostModel,
    fetch: FetchOptions,
    cancel: Option<broadcast::Receiver<()>>,
}

impl<'p, P: ElevationProvider> GridBuilder<'p, P, NoTerrain> {
    pub fn new(elevation: &'p P) -> Self {
        Self {
            elevation,
            terrain: None,
            grid: GridOptions::default(),
            cost: CostModel::default(),
            fetch: FetchOptions::default(),
            cancel: None,
        }
    }
}

impl<'p, P, T> GridBuilder<'p, P, T>
where
    P: ElevationProvider,
    T: TerrainProvider,
{
    pub fn with_terrain<U: TerrainProvider>(self, terrain: &'p U) -> GridBuilder<'p, P, U> {
        GridBuilder {
            elevation: self.elevation,
            terrain: Some(terrain),
            grid: self.grid,
            cost: self.cost,
            fetch: self.fetch,
            cancel: self.cancel,
        }
    }

    pub fn with_grid_options(mut self, grid: GridOptions) -> Self {
        self.grid = grid;
        self
    }

    pub fn with_spacing(mut self, spacing_m: f64) -> Self {
        self.grid.spacing_m = spacing_m;
        self
    }

    pub fn with_cost_model(mut self, cost: CostModel) -> Self {
        self.cost = cost;
        self
    }

    pub fn with_fetch_options(mut self, fetch: FetchOptions) -> Self {
        self.fetch = fetch;
        self
    }

    /// Abort the provider lookups when `shutdown` fires.
    pub fn with_cancellation(mut self, shutdown: broadcast::Receiver<()>) -> Self {
        self.cancel = Some(shutdown);
        self
    }

    pub async fn build(self, start: GeoPoint, end: GeoPoint) -> RouteResult<BuiltGrid> {
        let phase = Instant::now();
        let bbox = bounding_box(&start, &end)?;
        let layout = GridLayout::covering(&bbox, &self.grid)?;
        let bounding_box_time = phase.elapsed();
        tracing::debug!(
            "Grid layout {}x{} ({} nodes) for {} -> {}",
            layout.cols,
            layout.rows,
            layout.node_count(),
            start,
            end
        );

        let phase = Instant::now();
        let positions = layout.positions();
        let terrain_cancel = self.cancel.as_ref().map(broadcast::Receiver::resubscribe);
        let elevations = fetch_elevations(self.elevation, &positions, &self.fetch, self.cancel).await?;
        let tags: Vec<Option<String>> = match self.terrain {
            Some(terrain) => fetch_terrain(terrain, &positions, &self.fetch, terrain_cancel)
                .await?
                .into_iter()
                .map(Some)
                .collect(),
            None => vec![None; positions.len()],
        };
        let elevation_fetch_time = phase.elapsed();

        let phase = Instant::now();
        let samples = elevations
            .into_iter()
            .zip(tags)
            .map(|(elevation_m, terrain)| NodeSample {
                elevation_m,
                terrain,
            })
            .collect();
        let graph = GeoGraph::assemble(layout, samples, &self.cost)?;
        let start_anchor = graph.anchor(&start)?;
        let end_anchor = graph.anchor(&end)?;
        let grid_build_time = phase.elapsed();

        tracing::debug!(
            "Grid built: {} nodes, {} edges, anchors {} -> {}",
            graph.node_count(),
            graph.edge_count(),
            start_anchor,
            end_anchor
        );

        Ok(BuiltGrid {
            graph,
            bounding_box: bbox,
            start,
            end,
            start_anchor,
            end_anchor,
            cost: self.cost,
            timings: BuildTimings {
                bounding_box: bounding_box_time,
                elevation_fetch: elevation_fetch_time,
                grid_build: grid_build_time,
            },
        })
    }

}
