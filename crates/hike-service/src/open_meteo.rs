//! Open-Meteo style batch elevation lookups.
//!
//! One GET per batch with comma-joined `latitude` and `longitude` query
//! parameters. The response lists elevations in meters in request order.

use std::time::Duration;

use hike_core::{ElevationUnit, GeoPoint, ProviderError};
use reqwest::Client;
use serde::Deserialize;

use crate::provider::{ElevationBatch, ElevationProvider};

pub const DEFAULT_OPEN_METEO_URL: &str = "https://api.open-meteo.com/v1/elevation";

#[derive(Debug, Deserialize)]
struct OpenMeteoElevationResponse {
    elevation: Option<Vec<f64>>,
}

#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl OpenMeteoProvider {
    pub fn new(client: Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            timeout,
        }
    }
}

impl ElevationProvider for OpenMeteoProvider {
    async fn elevations(&self, points: &[GeoPoint]) -> Result<ElevationBatch, ProviderError> {
        if points.is_empty() {
            return Ok(ElevationBatch::new(ElevationUnit::Meters));
        }

        let response = self
            .client
            .get(elevation_url(&self.base_url, points))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|err| ProviderError::Http(err.to_string()))?;

        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status().as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|err| ProviderError::Http(err.to_string()))?;
        parse_elevations(&body, points)
    }
}

/// Pair a response body with the points it was requested for.
pub fn parse_elevations(body: &str, points: &[GeoPoint]) -> Result<ElevationBatch, ProviderError> {
    let payload: OpenMeteoElevationResponse =
        serde_json::from_str(body).map_err(|err| ProviderError::Payload(err.to_string()))?;
    let values = payload
        .elevation
        .ok_or_else(|| ProviderError::Payload("missing elevation".to_string()))?;

    if values.len() != points.len() {
        return Err(ProviderError::Payload(format!(
            "expected {} samples, got {}",
            points.len(),
            values.len()
        )));
    }

    let mut batch = ElevationBatch::with_capacity(ElevationUnit::Meters, points.len());
    for (point, value) in points.iter().zip(values) {
        batch.insert(point, value);
    }
    Ok(batch)
}

/// Comma-separated coordinates along one axis, to six decimals (about 0.1 m).
fn coordinate_list(points: &[GeoPoint], axis: fn(&GeoPoint) -> f64) -> String {
    points
        .iter()
        .map(|point| format!("{:.6}", axis(point)))
        .collect::<Vec<_>>()
        .join(",")
}

fn elevation_url(base: &str, points: &[GeoPoint]) -> String {
    let joiner = if base.ends_with(['?', '&']) {
        ""
    } else if base.contains('?') {
        "&"
    } else {
        "?"
    };
    format!(
        "{base}{joiner}latitude={}&longitude={}",
        coordinate_list(points, |point| point.lat),
        coordinate_list(points, |point| point.lon)
    )
}
