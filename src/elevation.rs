//! USGS point-elevation client and slope estimation.
//!
//! EPQS answers `GET /v1/json?x=<lon>&y=<lat>&units=Meters&output=json`
//! with `{"value": <metres>}`; the sentinel −1000000 means no data. Slope
//! is estimated from the centre elevation and offset samples 100 m east
//! and north: percent slope is the elevation change per 100 m run.

use serde_json::Value;

use crate::error::{Result, ScoringError};
use crate::net::{with_retries, RetryPolicy};

pub const EPQS_URL: &str = "https://epqs.nationalmap.gov/v1/json";

const NO_DATA_SENTINEL: f64 = -1_000_000.0;

/// Metres per degree of latitude, and per degree of longitude at the
/// equator.
const M_PER_DEG_LAT: f64 = 110_540.0;
const M_PER_DEG_LON_EQ: f64 = 111_320.0;

/// Point elevation source. The production implementation is
/// [`EpqsClient`]; tests use fixed surfaces.
pub trait ElevationSource {
    fn elevation_m(
        &self,
        lat: f64,
        lon: f64,
    ) -> impl std::future::Future<Output = Result<Option<f64>>> + Send;
}

/// HTTP client for the EPQS endpoint.
pub struct EpqsClient {
    http: reqwest::Client,
    url: String,
    policy: RetryPolicy,
}

impl EpqsClient {
    pub fn new(url: impl Into<String>, policy: RetryPolicy) -> Result<EpqsClient> {
        let http = reqwest::Client::builder().timeout(policy.timeout).build()?;
        Ok(EpqsClient {
            http,
            url: url.into(),
            policy,
        })
    }

    pub fn new_default() -> Result<EpqsClient> {
        Self::new(EPQS_URL, RetryPolicy::default())
    }

    async fn fetch_once(&self, lat: f64, lon: f64) -> Result<Option<f64>> {
        let response = self
            .http
            .get(&self.url)
            .query(&[
                ("x", lon.to_string()),
                ("y", lat.to_string()),
                ("units", "Meters".to_string()),
                ("output", "json".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if status.is_server_error() {
            return Err(ScoringError::TransientUpstream(format!(
                "EPQS returned {}",
                status
            )));
        }
        if !status.is_success() {
            return Err(ScoringError::Internal(format!("EPQS returned {}", status)));
        }

        let body: Value = response.json().await?;
        Ok(parse_elevation(&body))
    }
}

impl ElevationSource for EpqsClient {
    async fn elevation_m(&self, lat: f64, lon: f64) -> Result<Option<f64>> {
        with_retries(&self.policy, "EPQS elevation", || self.fetch_once(lat, lon)).await
    }
}

/// Pull the elevation value out of an EPQS body, treating the no-data
/// sentinel as absent.
pub fn parse_elevation(body: &Value) -> Option<f64> {
    let value = match body.get("value")? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    if (value - NO_DATA_SENTINEL).abs() < 1.0 {
        return None;
    }
    Some(value)
}

/// Estimate percent slope at a point by sampling elevations 100 m east and
/// north of it. Returns `None` when any sample has no data.
pub async fn estimate_slope_pct<E: ElevationSource>(
    source: &E,
    lat: f64,
    lon: f64,
) -> Result<Option<f64>> {
    let dlat = 100.0 / M_PER_DEG_LAT;
    let dlon = 100.0 / (M_PER_DEG_LON_EQ * lat.to_radians().cos().abs().max(1e-6));

    let centre = source.elevation_m(lat, lon).await?;
    let east = source.elevation_m(lat, lon + dlon).await?;
    let north = source.elevation_m(lat + dlat, lon).await?;

    let (Some(centre), Some(east), Some(north)) = (centre, east, north) else {
        return Ok(None);
    };

    // Rise in metres over a 100 m run is already percent slope.
    let slope = (east - centre).abs().max((north - centre).abs());
    Ok(Some(slope))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use serde_json::json;

    /// Planar test surface: elevation = a·lat + b·lon (degrees).
    struct PlaneSource {
        a: f64,
        b: f64,
    }

    impl ElevationSource for PlaneSource {
        async fn elevation_m(&self, lat: f64, lon: f64) -> Result<Option<f64>> {
            Ok(Some(self.a * lat + self.b * lon))
        }
    }

    struct NoDataSource;

    impl ElevationSource for NoDataSource {
        async fn elevation_m(&self, _lat: f64, _lon: f64) -> Result<Option<f64>> {
            Ok(None)
        }
    }

    #[test]
    fn test_parse_elevation_values() {
        assert_relative_eq!(
            parse_elevation(&json!({"value": 923.5})).unwrap(),
            923.5
        );
        assert_relative_eq!(
            parse_elevation(&json!({"value": "923.5"})).unwrap(),
            923.5
        );
        assert!(parse_elevation(&json!({"value": -1000000})).is_none());
        assert!(parse_elevation(&json!({})).is_none());
    }

    #[tokio::test]
    async fn test_flat_surface_has_zero_slope() {
        let source = PlaneSource { a: 0.0, b: 0.0 };
        let slope = estimate_slope_pct(&source, 41.2, -101.6).await.unwrap();
        assert_relative_eq!(slope.unwrap(), 0.0, epsilon = 1e-9);
    }

    #[tokio::test]
    async fn test_tilted_surface_slope_scale() {
        // 110.54 m per degree of latitude → 0.1 m per 100 m → 0.1 % slope
        let source = PlaneSource { a: 110.54, b: 0.0 };
        let slope = estimate_slope_pct(&source, 0.0, 0.0).await.unwrap().unwrap();
        assert_relative_eq!(slope, 0.1, epsilon = 1e-3);
    }

    #[tokio::test]
    async fn test_missing_data_yields_none() {
        let slope = estimate_slope_pct(&NoDataSource, 41.2, -101.6).await.unwrap();
        assert!(slope.is_none());
    }
}
