//! Geographic viewport: the rectangle the radar queries and displays.
//!
//! A `BoundingBox` can only exist in a valid state (`min < max` on both
//! axes, all values finite). Edits go through [`BoundingBox::replace`], which
//! either yields the candidate or leaves the caller holding the old box.

use serde::{Deserialize, Serialize};

use crate::types::ValidationError;

/// Default viewport: the UK and Ireland.
pub const DEFAULT_LON_MIN: f64 = -12.551630;
pub const DEFAULT_LON_MAX: f64 = 3.356572;
pub const DEFAULT_LAT_MIN: f64 = 49.245382;
pub const DEFAULT_LAT_MAX: f64 = 61.380267;

/// Field names in user-facing input order.
pub const FIELD_NAMES: [&str; 4] = ["lon_min", "lon_max", "lat_min", "lat_max"];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BoundsInput")]
pub struct BoundingBox {
    lon_min: f64,
    lon_max: f64,
    lat_min: f64,
    lat_max: f64,
}

/// Unvalidated box as received from a client or config file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundsInput {
    pub lon_min: f64,
    pub lon_max: f64,
    pub lat_min: f64,
    pub lat_max: f64,
}

impl TryFrom<BoundsInput> for BoundingBox {
    type Error = ValidationError;

    fn try_from(input: BoundsInput) -> Result<Self, Self::Error> {
        BoundingBox::create(input.lon_min, input.lon_max, input.lat_min, input.lat_max)
    }
}

impl BoundingBox {
    /// Build a box, rejecting empty or inverted ranges.
    pub fn create(
        lon_min: f64,
        lon_max: f64,
        lat_min: f64,
        lat_max: f64,
    ) -> Result<Self, ValidationError> {
        let values = [lon_min, lon_max, lat_min, lat_max];
        for (field, value) in FIELD_NAMES.into_iter().zip(values) {
            if !value.is_finite() {
                return Err(ValidationError::NotFinite { field });
            }
        }
        if lon_min >= lon_max {
            return Err(ValidationError::LongitudeRange {
                min: lon_min,
                max: lon_max,
            });
        }
        if lat_min >= lat_max {
            return Err(ValidationError::LatitudeRange {
                min: lat_min,
                max: lat_max,
            });
        }
        Ok(BoundingBox {
            lon_min,
            lon_max,
            lat_min,
            lat_max,
        })
    }

    /// Validate `candidate` as the successor of `current`.
    ///
    /// On error the caller keeps `current`; nothing here mutates it.
    pub fn replace(current: &BoundingBox, candidate: BoundsInput) -> Result<Self, ValidationError> {
        let next = BoundingBox::try_from(candidate)?;
        if next != *current {
            log::debug!("bounding box {current} -> {next}");
        }
        Ok(next)
    }

    /// Parse the four text inputs (lon_min, lon_max, lat_min, lat_max).
    pub fn parse_fields(fields: [&str; 4]) -> Result<BoundsInput, ValidationError> {
        let mut values = [0.0f64; 4];
        for (i, raw) in fields.iter().enumerate() {
            let raw = raw.trim();
            values[i] = raw.parse().map_err(|_| ValidationError::NotANumber {
                field: FIELD_NAMES[i],
                value: raw.to_string(),
            })?;
        }
        Ok(BoundsInput {
            lon_min: values[0],
            lon_max: values[1],
            lat_min: values[2],
            lat_max: values[3],
        })
    }

    pub fn lon_min(&self) -> f64 {
        self.lon_min
    }

    pub fn lon_max(&self) -> f64 {
        self.lon_max
    }

    pub fn lat_min(&self) -> f64 {
        self.lat_min
    }

    pub fn lat_max(&self) -> f64 {
        self.lat_max
    }

    pub fn width(&self) -> f64 {
        self.lon_max - self.lon_min
    }

    pub fn height(&self) -> f64 {
        self.lat_max - self.lat_min
    }

    /// Inclusive containment test.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.lon_min && lon <= self.lon_max && lat >= self.lat_min && lat <= self.lat_max
    }

    pub fn to_input(self) -> BoundsInput {
        BoundsInput {
            lon_min: self.lon_min,
            lon_max: self.lon_max,
            lat_min: self.lat_min,
            lat_max: self.lat_max,
        }
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        BoundingBox {
            lon_min: DEFAULT_LON_MIN,
            lon_max: DEFAULT_LON_MAX,
            lat_min: DEFAULT_LAT_MIN,
            lat_max: DEFAULT_LAT_MAX,
        }
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "lon [{}, {}] lat [{}, {}]",
            self.lon_min, self.lon_max, self.lat_min, self.lat_max
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
