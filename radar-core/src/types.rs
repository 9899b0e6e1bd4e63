//! Shared types and error enums for radar-core.

use chrono::DateTime;
use serde::Serialize;
use thiserror::Error;

/// All errors produced by radar-core.
#[derive(Debug, Error)]
pub enum RadarError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, RadarError>;

/// A rejected bounding-box edit. The previous box stays in force.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} is not a number: {value:?}")]
    NotANumber { field: &'static str, value: String },
    #[error("{field} must be finite")]
    NotFinite { field: &'static str },
    #[error("longitude range is empty: min {min} >= max {max}")]
    LongitudeRange { min: f64, max: f64 },
    #[error("latitude range is empty: min {min} >= max {max}")]
    LatitudeRange { min: f64, max: f64 },
}

/// Why a snapshot could not be ingested. Callers treat every variant as
/// "zero aircraft this cycle".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    #[error("feed request failed: {0}")]
    Network(String),
    #[error("malformed feed response: {0}")]
    MalformedResponse(String),
    #[error("no data received from feed")]
    NoData,
}

impl IngestError {
    /// Stable machine-readable reason, used in logs and JSON payloads.
    pub fn reason(&self) -> &'static str {
        match self {
            IngestError::Network(_) => "network",
            IngestError::MalformedResponse(_) => "malformed_response",
            IngestError::NoData => "no_data",
        }
    }
}

// ---------------------------------------------------------------------------
// Aircraft records
// ---------------------------------------------------------------------------

/// One aircraft in a snapshot. Built once by the ingester, never mutated.
///
/// `longitude`/`latitude` are always present: rows without a position are
/// dropped during ingestion because they can be neither drawn nor clicked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AircraftRecord {
    /// 24-bit transponder address as lowercase hex (`icao24`).
    pub icao_id: String,
    /// Trimmed callsign; `None` when the feed sent null or blanks.
    pub callsign: Option<String>,
    pub origin_country: String,
    pub time_position: Option<i64>,
    /// Unix epoch seconds of the last message received from the aircraft.
    pub last_contact: i64,
    pub longitude: f64,
    pub latitude: f64,
    /// Barometric altitude in metres.
    pub baro_altitude: Option<f64>,
    pub on_ground: bool,
    /// Ground speed in m/s.
    pub velocity: Option<f64>,
    /// Degrees clockwise from north, 0-360.
    pub true_track: Option<f64>,
    /// m/s, positive when climbing.
    pub vertical_rate: Option<f64>,
    pub geo_altitude: Option<f64>,
    pub squawk: Option<String>,
    pub position_source: Option<u8>,
}

/// A position in plot space. Also used for pointer clicks, which arrive in
/// the same coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProjectedPoint {
    pub x: f64,
    pub y: f64,
}

impl ProjectedPoint {
    pub fn new(x: f64, y: f64) -> Self {
        ProjectedPoint { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn distance_to(&self, other: &ProjectedPoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Format a Unix epoch as a UTC time of day (`HH:MM:SS`).
///
/// Out-of-range epochs yield `"-"` instead of failing.
pub fn format_time_of_day(epoch: i64) -> String {
    match DateTime::from_timestamp(epoch, 0) {
        Some(dt) => dt.format("%H:%M:%S").to_string(),
        None => "-".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
