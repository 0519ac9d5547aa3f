//! Per-point elevation cache in front of another provider.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use hike_core::{ElevationUnit, GeoPoint, PointKey, ProviderError};

use crate::provider::{ElevationBatch, ElevationProvider};

#[derive(Debug, Clone, Copy)]
struct CachedElevation {
    fetched_at: Instant,
    elevation_m: f64,
}

/// Serves fresh elevations from memory and forwards only misses.
///
/// Cached values are stored and returned in meters whatever the inner
/// provider reports.
#[derive(Debug)]
pub struct CachedElevationProvider<P> {
    inner: P,
    entries: DashMap<PointKey, CachedElevation>,
    ttl: Duration,
    max_entries: usize,
}

impl<P> CachedElevationProvider<P> {
    pub fn new(inner: P, ttl: Duration, max_entries: usize) -> Self {
        Self {
            inner,
            entries: DashMap::new(),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn fresh(&self, key: &PointKey) -> Option<f64> {
        self.entries
            .get(key)
            .filter(|entry| entry.fetched_at.elapsed() <= self.ttl)
            .map(|entry| entry.elevation_m)
    }

    /// Evict samples older than the ttl as of `now`, then the earliest
    /// fetched until the cache is back within `max_entries`.
    fn prune(&self, now: Instant) {
        self.entries
            .retain(|_, sample| now.saturating_duration_since(sample.fetched_at) <= self.ttl);

        let excess = self.entries.len().saturating_sub(self.max_entries);
        if excess == 0 {
            return;
        }
        let mut by_age: Vec<(Instant, PointKey)> = self
            .entries
            .iter()
            .map(|sample| (sample.fetched_at, *sample.key()))
            .collect();
        by_age.sort_unstable();
        for (_, key) in by_age.into_iter().take(excess) {
            self.entries.remove(&key);
        }
        tracing::debug!("Elevation cache evicted {} samples over capacity", excess);
    }
}

impl<P: ElevationProvider> ElevationProvider for CachedElevationProvider<P> {
    async fn elevations(&self, points: &[GeoPoint]) -> Result<ElevationBatch, ProviderError> {
        let mut batch = ElevationBatch::with_capacity(ElevationUnit::Meters, points.len());
        let mut misses = Vec::new();
        for point in points {
            match self.fresh(&point.key()) {
                Some(elevation_m) => batch.insert(point, elevation_m),
                None => misses.push(*point),
            }
        }

        if misses.is_empty() {
            tracing::debug!("Elevation cache served all {} points", points.len());
            return Ok(batch);
        }

        tracing::debug!(
            "Elevation cache miss for {} of {} points",
            misses.len(),
            points.len()
        );
        let fetched = self.inner.elevations(&misses).await?;
        let now = Instant::now();
        for point in &misses {
            let key = point.key();
            let raw = fetched
                .values
                .get(&key)
                .copied()
                .ok_or(ProviderError::MissingSample(*point))?;
            let elevation_m = fetched.unit.to_meters(raw);
            if elevation_m.is_finite() {
                self.entries.insert(
                    key,
                    CachedElevation {
                        fetched_at: now,
                        elevation_m,
                    },
                );
            }
            batch.values.insert(key, elevation_m);
        }

        if self.entries.len() > self.max_entries {
            self.prune(now);
        }
        Ok(batch)
    }
}
