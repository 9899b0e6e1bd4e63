//! State-vector feed transport.
//!
//! `StateFeed` is the seam between the radar and the network: production
//! uses [`OpenSkyClient`], tests plug in canned bodies. Parsing lives in
//! `radar_core::ingest`; this module only moves bytes.

use std::sync::Arc;
use std::time::Duration;

use radar_core::ingest;
use radar_core::{AircraftRecord, BoundingBox, IngestError};

/// Fetches the raw `states/all` body for a bounding box.
#[async_trait::async_trait]
pub trait StateFeed: Send + Sync {
    async fn get_states(&self, bbox: &BoundingBox) -> Result<String, IngestError>;
}

/// HTTP client for an OpenSky-compatible REST endpoint.
#[derive(Clone)]
pub struct OpenSkyClient {
    base_url: String,
    client: reqwest::Client,
}

impl OpenSkyClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("skyradar/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|e| {
                log::warn!("HTTP client setup failed ({e}), using defaults");
                reqwest::Client::new()
            });
        OpenSkyClient {
            base_url: base_url.to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait::async_trait]
impl StateFeed for OpenSkyClient {
    async fn get_states(&self, bbox: &BoundingBox) -> Result<String, IngestError> {
        let url = ingest::states_url(&self.base_url, bbox);
        log::debug!("GET {url}");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| IngestError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::Network(format!("HTTP {status} from {url}")));
        }

        response
            .text()
            .await
            .map_err(|e| IngestError::Network(e.to_string()))
    }
}

/// Fetch + normalize: one snapshot per call.
#[derive(Clone)]
pub struct SnapshotIngester {
    feed: Arc<dyn StateFeed>,
}

impl SnapshotIngester {
    pub fn new(feed: Arc<dyn StateFeed>) -> Self {
        SnapshotIngester { feed }
    }

    pub async fn fetch(&self, bbox: &BoundingBox) -> Result<Vec<AircraftRecord>, IngestError> {
        let body = self.feed.get_states(bbox).await?;
        ingest::parse_states(&body)
    }
}

// ---------------------------------------------------------------------------
// Test doubles
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Serves queued bodies in order, then repeats the last one.
    pub(crate) struct StaticFeed {
        bodies: Mutex<Vec<Result<String, IngestError>>>,
        pub(crate) requested: Mutex<Vec<BoundingBox>>,
    }

    impl StaticFeed {
        pub(crate) fn new(bodies: Vec<Result<String, IngestError>>) -> Self {
            StaticFeed {
                bodies: Mutex::new(bodies),
                requested: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn body(body: serde_json::Value) -> Self {
            StaticFeed::new(vec![Ok(body.to_string())])
        }
    }

    #[async_trait::async_trait]
    impl StateFeed for StaticFeed {
        async fn get_states(&self, bbox: &BoundingBox) -> Result<String, IngestError> {
            self.requested.lock().unwrap().push(*bbox);
            let mut bodies = self.bodies.lock().unwrap();
            match bodies.len() {
                0 => Err(IngestError::NoData),
                1 => bodies[0].clone(),
                _ => bodies.remove(0),
            }
        }
    }

    /// One 17-column state row.
    pub(crate) fn state_row(icao: &str, callsign: &str, lon: f64, lat: f64, track: f64) -> serde_json::Value {
        serde_json::json!([
            icao, callsign, "United Kingdom", 1700000000, 1700000000, lon, lat,
            10668.0, false, 231.5, track, 0.0, null, 10980.0, "2201", false, 0
        ])
    }
}
