//! State-vector feed normalization.
//!
//! No I/O here: the caller performs the HTTP request against
//! [`states_url`] and hands the body to [`parse_states`]. The feed returns
//! `{"states": [[...], ...]}` where each row is a positional array whose
//! width depends on the feed's schema version (17 or 18 columns). The width
//! is resolved once per response into a [`SchemaVersion`]; every row is then
//! mapped through that version's fixed column table.

use serde_json::Value;

use crate::bbox::BoundingBox;
use crate::types::{AircraftRecord, IngestError};

/// Public state-vector API.
pub const DEFAULT_FEED_BASE: &str = "https://opensky-network.org/api";

static NULL: Value = Value::Null;

/// Build the `states/all` query for a bounding box.
pub fn states_url(base: &str, bbox: &BoundingBox) -> String {
    format!(
        "{}/states/all?lamin={}&lomin={}&lamax={}&lomax={}",
        base.trim_end_matches('/'),
        bbox.lat_min(),
        bbox.lon_min(),
        bbox.lat_max(),
        bbox.lon_max()
    )
}

// ---------------------------------------------------------------------------
// Schema versions
// ---------------------------------------------------------------------------

/// Feed columns in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Icao24,
    Callsign,
    OriginCountry,
    TimePosition,
    LastContact,
    Longitude,
    Latitude,
    BaroAltitude,
    OnGround,
    Velocity,
    TrueTrack,
    VerticalRate,
    Sensors,
    GeoAltitude,
    Squawk,
    Spi,
    PositionSource,
    /// Trailing column of the 18-wide schema. Never read.
    Unused,
}

const COLUMNS_17: [Column; 17] = [
    Column::Icao24,
    Column::Callsign,
    Column::OriginCountry,
    Column::TimePosition,
    Column::LastContact,
    Column::Longitude,
    Column::Latitude,
    Column::BaroAltitude,
    Column::OnGround,
    Column::Velocity,
    Column::TrueTrack,
    Column::VerticalRate,
    Column::Sensors,
    Column::GeoAltitude,
    Column::Squawk,
    Column::Spi,
    Column::PositionSource,
];

const COLUMNS_18: [Column; 18] = [
    Column::Icao24,
    Column::Callsign,
    Column::OriginCountry,
    Column::TimePosition,
    Column::LastContact,
    Column::Longitude,
    Column::Latitude,
    Column::BaroAltitude,
    Column::OnGround,
    Column::Velocity,
    Column::TrueTrack,
    Column::VerticalRate,
    Column::Sensors,
    Column::GeoAltitude,
    Column::Squawk,
    Column::Spi,
    Column::PositionSource,
    Column::Unused,
];

/// Row layout of a feed response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaVersion {
    /// 17 columns.
    Standard,
    /// 18 columns; the last one carries nothing we use.
    Extended,
}

impl SchemaVersion {
    /// Resolve the schema from a row width.
    pub fn detect(width: usize) -> Option<Self> {
        match width {
            17 => Some(SchemaVersion::Standard),
            18 => Some(SchemaVersion::Extended),
            _ => None,
        }
    }

    pub fn width(self) -> usize {
        self.columns().len()
    }

    pub fn columns(self) -> &'static [Column] {
        match self {
            SchemaVersion::Standard => &COLUMNS_17,
            SchemaVersion::Extended => &COLUMNS_18,
        }
    }

    fn cell<'a>(self, row: &'a [Value], column: Column) -> &'a Value {
        self.columns()
            .iter()
            .position(|c| *c == column)
            .and_then(|i| row.get(i))
            .unwrap_or(&NULL)
    }

    /// Map one row. `Ok(None)` means the row has no usable position; `Err`
    /// carries the reason the row was rejected.
    fn map_row(self, row: &Value) -> Result<Option<AircraftRecord>, String> {
        let row = match row.as_array() {
            Some(cells) if cells.len() == self.width() => cells.as_slice(),
            Some(cells) => {
                return Err(format!(
                    "{} columns, expected {}",
                    cells.len(),
                    self.width()
                ))
            }
            None => return Err("row is not an array".into()),
        };

        let icao_id = self
            .cell(row, Column::Icao24)
            .as_str()
            .map(|s| s.trim().to_ascii_lowercase())
            .filter(|s| !s.is_empty())
            .ok_or("icao24 missing")?;

        let (Some(longitude), Some(latitude)) = (
            number(self.cell(row, Column::Longitude)),
            number(self.cell(row, Column::Latitude)),
        ) else {
            return Ok(None);
        };

        let last_contact = integer(self.cell(row, Column::LastContact))
            .ok_or_else(|| format!("{icao_id}: last_contact missing"))?;

        Ok(Some(AircraftRecord {
            callsign: self
                .cell(row, Column::Callsign)
                .as_str()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from),
            origin_country: self
                .cell(row, Column::OriginCountry)
                .as_str()
                .unwrap_or_default()
                .to_string(),
            time_position: integer(self.cell(row, Column::TimePosition)),
            last_contact,
            longitude,
            latitude,
            baro_altitude: number(self.cell(row, Column::BaroAltitude)),
            on_ground: self.cell(row, Column::OnGround).as_bool().unwrap_or(false),
            velocity: number(self.cell(row, Column::Velocity)),
            true_track: number(self.cell(row, Column::TrueTrack)),
            vertical_rate: number(self.cell(row, Column::VerticalRate)),
            geo_altitude: number(self.cell(row, Column::GeoAltitude)),
            squawk: self
                .cell(row, Column::Squawk)
                .as_str()
                .map(String::from),
            position_source: self
                .cell(row, Column::PositionSource)
                .as_u64()
                .and_then(|v| u8::try_from(v).ok()),
            icao_id,
        }))
    }
}

fn number(v: &Value) -> Option<f64> {
    v.as_f64().filter(|f| f.is_finite())
}

fn integer(v: &Value) -> Option<i64> {
    v.as_i64().or_else(|| number(v).map(|f| f as i64))
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse a raw response body.
pub fn parse_states(body: &str) -> Result<Vec<AircraftRecord>, IngestError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| IngestError::MalformedResponse(format!("body is not JSON: {e}")))?;
    parse_states_value(&value)
}

/// Normalize an already-decoded response.
///
/// `states: null` and `states: []` are [`IngestError::NoData`]. A successful
/// result may still be empty when no row carried a position.
pub fn parse_states_value(value: &Value) -> Result<Vec<AircraftRecord>, IngestError> {
    let states = value
        .get("states")
        .ok_or_else(|| IngestError::MalformedResponse("missing `states` field".into()))?;

    let rows = match states {
        Value::Null => return Err(IngestError::NoData),
        Value::Array(rows) => rows,
        _ => {
            return Err(IngestError::MalformedResponse(
                "`states` is not an array".into(),
            ))
        }
    };

    let first = rows.first().ok_or(IngestError::NoData)?;
    let width = first
        .as_array()
        .map(Vec::len)
        .ok_or_else(|| IngestError::MalformedResponse("state row is not an array".into()))?;
    let schema = SchemaVersion::detect(width).ok_or_else(|| {
        IngestError::MalformedResponse(format!("unsupported state row width {width}"))
    })?;

    log::info!(
        "feed returned {} state rows ({} columns)",
        rows.len(),
        schema.width()
    );

    let mut records = Vec::with_capacity(rows.len());
    let mut without_position = 0usize;
    let mut rejected = 0usize;

    for row in rows {
        match schema.map_row(row) {
            Ok(Some(record)) => records.push(record),
            Ok(None) => without_position += 1,
            Err(reason) => {
                log::warn!("skipping state row: {reason}");
                rejected += 1;
            }
        }
    }

    if without_position > 0 || rejected > 0 {
        log::debug!(
            "{} usable rows, {without_position} without position, {rejected} rejected",
            records.len()
        );
    }

    Ok(records)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
