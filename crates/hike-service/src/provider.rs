//! Elevation and terrain provider capabilities.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use hike_core::{ElevationUnit, GeoPoint, PointKey, ProviderError};

/// Elevations for one batch of points, keyed by position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElevationBatch {
    pub unit: ElevationUnit,
    pub values: HashMap<PointKey, f64>,
}

impl ElevationBatch {
    pub fn new(unit: ElevationUnit) -> Self {
        Self {
            unit,
            values: HashMap::new(),
        }
    }

    pub fn with_capacity(unit: ElevationUnit, capacity: usize) -> Self {
        Self {
            unit,
            values: HashMap::with_capacity(capacity),
        }
    }

    pub fn insert(&mut self, point: &GeoPoint, value: f64) {
        self.values.insert(point.key(), value);
    }

    /// Raw value for `point`, in [`Self::unit`].
    pub fn get(&self, point: &GeoPoint) -> Option<f64> {
        self.values.get(&point.key()).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Source of elevation samples.
///
/// A call resolves every point or fails as a whole. Callers never see a
/// partially filled batch.
pub trait ElevationProvider: Send + Sync {
    fn elevations(
        &self,
        points: &[GeoPoint],
    ) -> impl Future<Output = Result<ElevationBatch, ProviderError>> + Send;
}

impl<P: ElevationProvider> ElevationProvider for Arc<P> {
    fn elevations(
        &self,
        points: &[GeoPoint],
    ) -> impl Future<Output = Result<ElevationBatch, ProviderError>> + Send {
        self.as_ref().elevations(points)
    }
}

/// Optional source of terrain classifications. Every requested point must come
/// back tagged; tags never affect routing.
pub trait TerrainProvider: Send + Sync {
    fn classify(
        &self,
        points: &[GeoPoint],
    ) -> impl Future<Output = Result<HashMap<PointKey, String>, ProviderError>> + Send;
}

/// Terrain provider that tags nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTerrain;

impl TerrainProvider for NoTerrain {
    async fn classify(&self, _points: &[GeoPoint]) -> Result<HashMap<PointKey, String>, ProviderError> {
        Ok(HashMap::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_lookup_ignores_float_noise() {
        let mut batch = ElevationBatch::new(ElevationUnit::Feet);
        let point = GeoPoint::new(-105.2795, 40.0150);
        batch.insert(&point, 5430.0);

        let noisy = GeoPoint::new(point.lon + 1e-12, point.lat - 1e-12);
        assert_eq!(batch.get(&noisy), Some(5430.0));
        assert_eq!(batch.get(&GeoPoint::new(-105.2796, 40.0150)), None);
        assert_eq!(batch.len(), 1);
    }

    #[tokio::test]
    async fn no_terrain_tags_nothing() {
        let tags = NoTerrain
            .classify(&[GeoPoint::new(0.0, 0.0)])
            .await
            .unwrap();
        assert!(tags.is_empty());
    }
}
