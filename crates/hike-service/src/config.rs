//! Planner configuration from environment.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use hike_core::{CostModel, ElevationUnit, GridOptions};

use crate::fetch::FetchOptions;
use crate::open_meteo::DEFAULT_OPEN_METEO_URL;
use crate::usgs::DEFAULT_EPQS_URL;

#[derive(Debug, Clone)]
pub struct Config {
    pub elevation_url: String,
    pub elevation_units: ElevationUnit,
    pub grid: GridOptions,
    pub cost: CostModel,
    pub fetch: FetchOptions,
    pub cache_ttl: Duration,
    pub cache_max_entries: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            elevation_url: DEFAULT_OPEN_METEO_URL.to_string(),
            elevation_units: ElevationUnit::Meters,
            grid: GridOptions::default(),
            cost: CostModel::default(),
            fetch: FetchOptions::default(),
            cache_ttl: Duration::from_secs(3600),
            cache_max_entries: 100_000,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from any `name -> value` source, falling back per field.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Config::default();

        let elevation_units = lookup("HIKE_ELEVATION_UNITS")
            .and_then(|value| ElevationUnit::parse(&value))
            .unwrap_or(defaults.elevation_units);
        let default_url = match elevation_units {
            ElevationUnit::Meters => DEFAULT_OPEN_METEO_URL,
            ElevationUnit::Feet => DEFAULT_EPQS_URL,
        };
        let elevation_url = lookup("HIKE_ELEVATION_URL")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| default_url.to_string());

        Self {
            elevation_url,
            elevation_units,
            grid: GridOptions {
                spacing_m: env_value(&lookup, "HIKE_NODE_SPACING_M")
                    .filter(|spacing: &f64| spacing.is_finite() && *spacing > 0.0)
                    .unwrap_or(defaults.grid.spacing_m),
                max_nodes: env_value(&lookup, "HIKE_MAX_GRID_NODES").unwrap_or(defaults.grid.max_nodes),
                ..defaults.grid
            },
            cost: defaults.cost,
            fetch: FetchOptions {
                max_concurrent: env_value(&lookup, "HIKE_MAX_CONCURRENT_LOOKUPS")
                    .filter(|count: &usize| *count > 0)
                    .unwrap_or(defaults.fetch.max_concurrent),
                max_points_per_request: env_value(&lookup, "HIKE_POINTS_PER_REQUEST")
                    .filter(|count: &usize| *count > 0)
                    .unwrap_or(defaults.fetch.max_points_per_request),
                timeout: env_value(&lookup, "HIKE_LOOKUP_TIMEOUT_S")
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.fetch.timeout),
            },
            cache_ttl: env_value(&lookup, "HIKE_CACHE_TTL_S")
                .map(Duration::from_secs)
                .unwrap_or(defaults.cache_ttl),
            cache_max_entries: env_value(&lookup, "HIKE_CACHE_MAX_ENTRIES").unwrap_or(defaults.cache_max_entries),
        }
    }
}

fn env_value<T: FromStr>(lookup: &dyn Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    lookup(name).and_then(|value| value.trim().parse().ok())
}
