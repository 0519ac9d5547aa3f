//! Bounded fan-out of per-node lookups for one grid build.
//!
//! Points are split into provider-sized chunks and at most
//! [`FetchOptions::max_concurrent`] chunks are outstanding at once. The whole
//! batch shares one deadline and one cancellation signal; on either, every
//! in-flight request is dropped and nothing is returned. Elevations and
//! terrain tags go through the same fan-out.

use std::collections::HashMap;
use std::future::Future;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use hike_core::{GeoPoint, PointKey, ProviderError};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use crate::provider::{ElevationProvider, TerrainProvider};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchOptions {
    pub max_concurrent: usize,
    pub max_points_per_request: usize,
    pub timeout: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            max_concurrent: 8,
            max_points_per_request: 100,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Fetch elevations for `points`, returned in meters and in input order.
pub async fn fetch_elevations<P: ElevationProvider>(
    provider: &P,
    points: &[GeoPoint],
    options: &FetchOptions,
    cancel: Option<broadcast::Receiver<()>>,
) -> Result<Vec<f64>, ProviderError> {
    let merged = fan_out("Elevation", points, options, cancel, |chunk| async move {
        let batch = provider.elevations(chunk).await?;
        let unit = batch.unit;
        Ok::<_, ProviderError>(
            batch
                .values
                .into_iter()
                .map(|(key, value)| (key, unit.to_meters(value)))
                .collect::<HashMap<_, _>>(),
        )
    })
    .await?;

    let mut elevations = Vec::with_capacity(points.len());
    for point in points {
        let value = *merged
            .get(&point.key())
            .ok_or(ProviderError::MissingSample(*point))?;
        if !value.is_finite() {
            return Err(ProviderError::InvalidSample {
                point: *point,
                value,
            });
        }
        elevations.push(value);
    }
    Ok(elevations)
}

/// Fetch one terrain tag per point, in input order. An untagged point fails the batch.
pub async fn fetch_terrain<T: TerrainProvider>(
    provider: &T,
    points: &[GeoPoint],
    options: &FetchOptions,
    cancel: Option<broadcast::Receiver<()>>,
) -> Result<Vec<String>, ProviderError> {
    let merged = fan_out("Terrain", points, options, cancel, |chunk| provider.classify(chunk)).await?;
    points
        .iter()
        .map(|point| {
            merged
                .get(&point.key())
                .cloned()
                .ok_or(ProviderError::MissingSample(*point))
        })
        .collect()
}

async fn fan_out<'a, V, F, Fut>(
    kind: &str,
    points: &'a [GeoPoint],
    options: &FetchOptions,
    cancel: Option<broadcast::Receiver<()>>,
    lookup: F,
) -> Result<HashMap<PointKey, V>, ProviderError>
where
    F: Fn(&'a [GeoPoint]) -> Fut,
    Fut: Future<Output = Result<HashMap<PointKey, V>, ProviderError>>,
{
    if points.is_empty() {
        return Ok(HashMap::new());
    }

    let chunk_size = options.max_points_per_request.max(1);
    let concurrency = options.max_concurrent.max(1);
    let chunks = points.len().div_ceil(chunk_size);
    let started = Instant::now();
    tracing::debug!(
        "{} lookups for {} points in {} chunk(s), {} at a time",
        kind,
        points.len(),
        chunks,
        concurrency
    );

    let lookups = async {
        let mut responses = stream::iter(points.chunks(chunk_size).enumerate())
            .map(|(idx, chunk)| {
                tracing::debug!("{} chunk {} dispatched ({} points)", kind, idx, chunk.len());
                lookup(chunk)
            })
            .buffer_unordered(concurrency);

        let mut merged = HashMap::with_capacity(points.len());
        while let Some(response) = responses.next().await {
            merged.extend(response?);
        }
        Ok::<_, ProviderError>(merged)
    };

    let merged = tokio::select! {
        outcome = tokio::time::timeout(options.timeout, lookups) => match outcome {
            Ok(Ok(merged)) => merged,
            Ok(Err(err)) => {
                tracing::warn!("{} lookup failed: {}", kind, err);
                return Err(err);
            }
            Err(_) => {
                tracing::warn!("{} lookups timed out after {:?}", kind, options.timeout);
                return Err(ProviderError::Timeout(options.timeout));
            }
        },
        _ = cancelled(cancel) => {
            tracing::warn!("{} lookups cancelled after {:?}", kind, started.elapsed());
            return Err(ProviderError::Cancelled);
        }
    };

    tracing::debug!(
        "{} lookups returned {} values in {:?}",
        kind,
        merged.len(),
        started.elapsed()
    );
    Ok(merged)
}

/// Resolves once a shutdown signal arrives. A closed or absent channel never fires.
async fn cancelled(cancel: Option<broadcast::Receiver<()>>) {
    match cancel {
        Some(mut shutdown) => match shutdown.recv().await {
            Ok(()) | Err(RecvError::Lagged(_)) => {}
            Err(RecvError::Closed) => std::future::pending().await,
        },
        None => std::future::pending().await,
    }
}
