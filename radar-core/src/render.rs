//! Display payloads handed to the map front-end.
//!
//! The front-end owns drawing and bitmap rotation. It receives a
//! [`RenderFrame`] after each refresh and an [`InfoPanel`] after each click.

use serde::Serialize;

use crate::bbox::BoundingBox;
use crate::hittest::Hit;
use crate::registry::Registry;
use crate::types::{format_time_of_day, AircraftRecord};

pub const DEFAULT_ICON_SCALE: f64 = 0.1;

/// Base-map appearance: land/sea mask colours and graticule spacing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapStyle {
    pub land_color: String,
    pub ocean_color: String,
    /// Degrees between grid lines.
    pub grid_spacing: f64,
    pub icon_scale: f64,
}

impl Default for MapStyle {
    fn default() -> Self {
        MapStyle {
            land_color: "green".into(),
            ocean_color: "aqua".into(),
            grid_spacing: 1.25,
            icon_scale: DEFAULT_ICON_SCALE,
        }
    }
}

/// Where to draw one aircraft icon.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IconPlacement {
    pub icao_id: String,
    pub x: f64,
    pub y: f64,
    /// Counter-clockwise rotation to apply to a north-up icon bitmap.
    pub rotation_deg: f64,
}

/// Icon rotation for a track (clockwise from north). Unknown track → north-up.
pub fn icon_rotation(true_track: Option<f64>) -> f64 {
    match true_track.filter(|t| t.is_finite()) {
        Some(track) => 0.0 - track.rem_euclid(360.0),
        None => 0.0,
    }
}

/// Everything the front-end needs to redraw the radar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderFrame {
    pub extent: BoundingBox,
    pub style: MapStyle,
    pub placements: Vec<IconPlacement>,
    pub total_aircraft: usize,
}

impl RenderFrame {
    pub fn build(extent: BoundingBox, style: &MapStyle, registry: &Registry) -> Self {
        let placements = registry
            .iter()
            .map(|(record, point)| IconPlacement {
                icao_id: record.icao_id.clone(),
                x: point.x,
                y: point.y,
                rotation_deg: icon_rotation(record.true_track),
            })
            .collect();
        RenderFrame {
            extent,
            style: style.clone(),
            placements,
            total_aircraft: registry.len(),
        }
    }
}

// ---------------------------------------------------------------------------
// Info panel
// ---------------------------------------------------------------------------

pub const INFO_LABELS: [&str; 7] = [
    "Callsign",
    "Country of Origin",
    "Longitude",
    "Latitude",
    "Velocity",
    "Track",
    "Last Contact",
];

/// The seven-line aircraft info panel. Blank values mean nothing is selected.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfoPanel {
    pub hit: Option<Hit>,
    pub icao_id: Option<String>,
    pub values: [String; 7],
}

impl InfoPanel {
    /// The blank template shown when no aircraft is selected.
    pub fn empty() -> Self {
        InfoPanel {
            hit: None,
            icao_id: None,
            values: Default::default(),
        }
    }

    pub fn for_record(hit: Hit, record: &AircraftRecord) -> Self {
        let dash = || "-".to_string();
        InfoPanel {
            hit: Some(hit),
            icao_id: Some(record.icao_id.clone()),
            values: [
                record.callsign.clone().unwrap_or_else(dash),
                record.origin_country.clone(),
                format!("{:.2}", record.longitude),
                format!("{:.2}", record.latitude),
                record.velocity.map(|v| format!("{v}m/s")).unwrap_or_else(dash),
                record.true_track.map(|t| format!("{t}°")).unwrap_or_else(dash),
                format_time_of_day(record.last_contact),
            ],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hit.is_none()
    }

    pub fn lines(&self) -> Vec<String> {
        INFO_LABELS
            .iter()
            .zip(&self.values)
            .map(|(label, value)| {
                if value.is_empty() {
                    format!("{label}:")
                } else {
                    format!("{label}: {value}")
                }
            })
            .collect()
    }
}

impl std::fmt::Display for InfoPanel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.lines().join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::tests::record;

    #[test]
    fn test_icon_rotation() {
        assert_eq!(icon_rotation(Some(90.0)), -90.0);
        assert_eq!(icon_rotation(Some(0.0)), 0.0);
        assert_eq!(icon_rotation(Some(450.0)), -90.0);
        assert_eq!(icon_rotation(Some(-90.0)), -270.0);
        assert_eq!(icon_rotation(None), 0.0);
        assert_eq!(icon_rotation(Some(f64::NAN)), 0.0);
    }

    #[test]
    fn test_frame_matches_registry() {
        let reg = Registry::from_records(
            vec![record("aaaaaa", "A1", -1.0, 50.0), record("bbbbbb", "B2", 0.5, 51.0)],
            &BoundingBox::default(),
        );
        let frame = RenderFrame::build(BoundingBox::default(), &MapStyle::default(), &reg);
        assert_eq!(frame.total_aircraft, 2);
        assert_eq!(frame.placements.len(), 2);
        assert_eq!(frame.placements[1].icao_id, "bbbbbb");
        assert_eq!(frame.placements[1].x, 0.5);
        assert_eq!(frame.placements[1].y, 51.0);
        assert_eq!(frame.placements[1].rotation_deg, -90.0);
        assert_eq!(frame.style.land_color, "green");
        assert_eq!(frame.style.ocean_color, "aqua");
    }

    #[test]
    fn test_empty_panel_text() {
        assert_eq!(
            InfoPanel::empty().to_string(),
            "Callsign:\nCountry of Origin:\nLongitude:\nLatitude:\nVelocity:\nTrack:\nLast Contact:"
        );
    }

    #[test]
    fn test_record_panel_text() {
        let mut r = record("400a0b", "BAW123", -0.5, 51.5);
        r.velocity = Some(231.5);
        let panel = InfoPanel::for_record(
            Hit {
                index: 0,
                distance: 0.0,
            },
            &r,
        );
        assert_eq!(
            panel.lines(),
            vec![
                "Callsign: BAW123",
                "Country of Origin: United Kingdom",
                "Longitude: -0.50",
                "Latitude: 51.50",
                "Velocity: 231.5m/s",
                "Track: 90°",
                "Last Contact: 22:13:20",
            ]
        );
        assert!(!panel.is_empty());
    }

    #[test]
    fn test_record_panel_unknown_fields() {
        let mut r = record("400a0b", "", 1.0, 52.0);
        r.velocity = None;
        r.true_track = None;
        let panel = InfoPanel::for_record(
            Hit {
                index: 3,
                distance: 0.1,
            },
            &r,
        );
        assert_eq!(panel.values[0], "-");
        assert_eq!(panel.values[4], "-");
        assert_eq!(panel.values[5], "-");
    }
}
