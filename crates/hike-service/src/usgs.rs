//! USGS Elevation Point Query Service lookups, one request per point, in feet.

use std::time::Duration;

use hike_core::{ElevationUnit, GeoPoint, ProviderError};
use reqwest::Client;
use serde::Deserialize;

use crate::provider::{ElevationBatch, ElevationProvider};

pub const DEFAULT_EPQS_URL: &str = "https://nationalmap.gov/epqs/pqs.php";

#[derive(Debug, Deserialize)]
struct EpqsResponse {
    #[serde(rename = "USGS_Elevation_Point_Query_Service")]
    service: EpqsService,
}

#[derive(Debug, Deserialize)]
struct EpqsService {
    #[serde(rename = "Elevation_Query")]
    query: EpqsQuery,
}

#[derive(Debug, Deserialize)]
struct EpqsQuery {
    #[serde(rename = "Elevation")]
    elevation: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct UsgsPointProvider {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl UsgsPointProvider {
    pub fn new(client: Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            timeout,
        }
    }

    async fn elevation_at(&self, point: &GeoPoint) -> Result<f64, ProviderError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("units", "feet".to_string()),
                ("output", "json".to_string()),
                ("x", format!("{:.7}", point.lon)),
                ("y", format!("{:.7}", point.lat)),
            ])
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
        parse_point_elevation(&body)
    }
}

impl ElevationProvider for UsgsPointProvider {
    /// Points are queried in sequence; the fan-out above bounds parallelism.
    async fn elevations(&self, points: &[GeoPoint]) -> Result<ElevationBatch, ProviderError> {
        let mut batch = ElevationBatch::with_capacity(ElevationUnit::Feet, points.len());
        for point in points {
            let value = self.elevation_at(point).await?;
            batch.insert(point, value);
        }
        Ok(batch)
    }
}

/// Extract the elevation from an EPQS JSON body.
///
/// The service reports out-of-coverage points as `-1000000`, sometimes as a
/// string; both are rejected.
pub fn parse_point_elevation(body: &str) -> Result<f64, ProviderError> {
    let payload: EpqsResponse =
        serde_json::from_str(body).map_err(|err| ProviderError::Payload(err.to_string()))?;

    let value = match &payload.service.query.elevation {
        serde_json::Value::Number(number) => number.as_f64(),
        serde_json::Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| ProviderError::Payload("elevation is not a number".to_string()))?;

    if value <= -1_000_000.0 {
        return Err(ProviderError::Payload("point outside elevation coverage".to_string()));
    }
    Ok(value)
}
