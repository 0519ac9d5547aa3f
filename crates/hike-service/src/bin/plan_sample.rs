//! Plans a few sample hikes against the configured elevation provider.

use anyhow::Result;
use hike_core::{ElevationUnit, GeoPoint};
use hike_service::{
    plan_route_with, CachedElevationProvider, Config, ElevationProvider, GridBuilder,
    OpenMeteoProvider, UsgsPointProvider,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

struct SampleHike {
    name: &'static str,
    start: GeoPoint,
    end: GeoPoint,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("hike_service=debug".parse()?))
        .init();

    let config = Config::from_env();
    tracing::info!(
        "Using {} elevations from {}",
        match config.elevation_units {
            ElevationUnit::Meters => "meter",
            ElevationUnit::Feet => "foot",
        },
        config.elevation_url
    );

    let client = reqwest::Client::builder().build()?;
    match config.elevation_units {
        ElevationUnit::Meters => {
            let provider = OpenMeteoProvider::new(client, config.elevation_url.clone(), config.fetch.timeout);
            run(CachedElevationProvider::new(provider, config.cache_ttl, config.cache_max_entries), &config).await
        }
        ElevationUnit::Feet => {
            let provider = UsgsPointProvider::new(client, config.elevation_url.clone(), config.fetch.timeout);
            run(CachedElevationProvider::new(provider, config.cache_ttl, config.cache_max_entries), &config).await
        }
    }
}

async fn run<P: ElevationProvider>(provider: P, config: &Config) -> Result<()> {
    let hikes = vec![
        SampleHike {
            name: "Chautauqua -> Royal Arch",
            start: GeoPoint::new(-105.2819, 39.9990),
            end: GeoPoint::new(-105.2838, 39.9944),
        },
        SampleHike {
            name: "Mount Sanitas trailhead -> summit",
            start: GeoPoint::new(-105.3048, 40.0210),
            end: GeoPoint::new(-105.3058, 40.0286),
        },
        SampleHike {
            name: "Bear Peak saddle traverse",
            start: GeoPoint::new(-105.2950, 39.9600),
            end: GeoPoint::new(-105.2895, 39.9622),
        },
    ];

    for hike in hikes {
        println!("\n=== {} ===", hike.name);
        let builder = GridBuilder::new(&provider)
            .with_grid_options(config.grid.clone())
            .with_cost_model(config.cost.clone())
            .with_fetch_options(config.fetch.clone());

        match plan_route_with(builder, hike.start, hike.end).await {
            Ok(planned) => {
                let route = &planned.route;
                let diagnostics = &planned.diagnostics;
                println!(
                    "distance {:.0} m | calories {:.1} kcal | eta {:.1} min | elevation {:+.1} m",
                    route.distance_m,
                    route.calories_kcal,
                    route.eta_secs / 60.0,
                    route.elevation_delta_m
                );
                println!(
                    "grid {} nodes / {} edges | fetch {:?} | build {:?} | search {:?}",
                    diagnostics.node_count,
                    diagnostics.edge_count,
                    diagnostics.elevation_fetch,
                    diagnostics.grid_build,
                    diagnostics.search
                );
                println!("path points: {}", route.path.len());
            }
            Err(err) => println!("failed: {}", err),
        }
    }

    Ok(())
}
