//! Route query surface.

use std::time::{Duration, Instant};

use hike_core::{GeoPoint, Route, RouteResult};
use serde::Serialize;

use crate::builder::GridBuilder;
use crate::provider::{ElevationProvider, TerrainProvider};

/// Phase timings for one planning call. Observability only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PlanDiagnostics {
    pub bounding_box: Duration,
    pub elevation_fetch: Duration,
    pub grid_build: Duration,
    pub search: Duration,
    pub node_count: usize,
    pub edge_count: usize,
}

impl PlanDiagnostics {
    pub fn total(&self) -> Duration {
        self.bounding_box + self.elevation_fetch + self.grid_build + self.search
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedRoute {
    pub route: Route,
    pub diagnostics: PlanDiagnostics,
}

/// Plan a walking route from `start` to `end` over a grid of `spacing_m` meters.
pub async fn plan_route<P: ElevationProvider>(
    start: GeoPoint,
    end: GeoPoint,
    spacing_m: f64,
    provider: &P,
) -> RouteResult<Route> {
    let planned = plan_route_with(GridBuilder::new(provider).with_spacing(spacing_m), start, end).await?;
    Ok(planned.route)
}

/// Plan with a fully configured builder and report phase timings.
pub async fn plan_route_with<P, T>(
    builder: GridBuilder<'_, P, T>,
    start: GeoPoint,
    end: GeoPoint,
) -> RouteResult<PlannedRoute>
where
    P: ElevationProvider,
    T: TerrainProvider,
{
    let built = match builder.build(start, end).await {
        Ok(built) => built,
        Err(err) => {
            tracing::warn!("Grid build failed for {} -> {}: {}", start, end, err);
            return Err(err);
        }
    };

    let search_started = Instant::now();
    let route = built.route()?;
    let diagnostics = PlanDiagnostics {
        bounding_box: built.timings.bounding_box,
        elevation_fetch: built.timings.elevation_fetch,
        grid_build: built.timings.grid_build,
        search: search_started.elapsed(),
        node_count: built.graph.node_count(),
        edge_count: built.graph.edge_count(),
    };

    tracing::info!(
        "Planned {} -> {}: {:.0} m, {:.1} kcal, eta {:.0} s, {} nodes in {:?}",
        start,
        end,
        route.distance_m,
        route.calories_kcal,
        route.eta_secs,
        route.nodes.len(),
        diagnostics.total()
    );

    Ok(PlannedRoute { route, diagnostics })
}
