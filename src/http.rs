//! OSRM-backed street snapping.
//!
//! Issues `GET {host}/nearest?loc={lat},{lng}` per candidate and reads the
//! `mapped_coordinate` field (`[lat, lng]`) from the JSON response.

use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::GpsPoint;
use crate::error::SnapError;
use crate::snapping::StreetSnapper;

/// Configuration for [`OsrmSnapper`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapConfig {
    /// Routing service base URL.
    /// Default: `http://router.project-osrm.org`
    pub host: String,
    /// Per-request timeout in seconds.
    /// Default: 10
    pub timeout_secs: u64,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            host: "http://router.project-osrm.org".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Deserialize)]
struct NearestResponse {
    mapped_coordinate: Option<[f64; 2]>,
}

/// Street snapper backed by an OSRM `nearest` endpoint.
#[derive(Debug, Clone)]
pub struct OsrmSnapper {
    client: reqwest::blocking::Client,
    config: SnapConfig,
}

impl OsrmSnapper {
    pub fn new(config: SnapConfig) -> Result<Self, SnapError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SnapError::Request(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &SnapConfig {
        &self.config
    }

    /// Lookup URL for one point.
    pub fn nearest_url(&self, point: &GpsPoint) -> String {
        format!(
            "{}/nearest?loc={},{}",
            self.config.host.trim_end_matches('/'),
            point.latitude,
            point.longitude
        )
    }
}

impl StreetSnapper for OsrmSnapper {
    fn snap(&self, point: &GpsPoint) -> Result<GpsPoint, SnapError> {
        let url = self.nearest_url(point);
        debug!("[Snapping] GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| SnapError::Request(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(SnapError::Status(status.as_u16()));
        }
        let body = response
            .text()
            .map_err(|e| SnapError::Request(e.to_string()))?;
        parse_nearest_response(&body)
    }
}

/// Extract the snapped coordinate from a `nearest` response body.
pub fn parse_nearest_response(body: &str) -> Result<GpsPoint, SnapError> {
    let parsed: NearestResponse =
        serde_json::from_str(body).map_err(|e| SnapError::MalformedResponse(e.to_string()))?;
    let [lat, lng] = parsed
        .mapped_coordinate
        .ok_or(SnapError::MissingField("mapped_coordinate"))?;
    Ok(GpsPoint::new(lat, lng))
}
