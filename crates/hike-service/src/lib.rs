//! Async grid construction and route planning over remote elevation data.

pub mod builder;
pub mod cache;
pub mod config;
pub mod fetch;
pub mod open_meteo;
pub mod provider;
pub mod service;
pub mod usgs;

pub use builder::{BuildTimings, BuiltGrid, GridBuilder};
pub use cache::CachedElevationProvider;
pub use config::Config;
pub use fetch::{fetch_elevations, fetch_terrain, FetchOptions};
pub use open_meteo::OpenMeteoProvider;
pub use provider::{ElevationBatch, ElevationProvider, NoTerrain, TerrainProvider};
pub use service::{plan_route, plan_route_with, PlanDiagnostics, PlannedRoute};
pub use usgs::UsgsPointProvider;
