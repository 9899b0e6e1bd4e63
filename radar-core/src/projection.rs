//! Geographic → plot coordinates.
//!
//! Plate carrée: longitude is x, latitude is y, one plot unit per degree.
//! The bounding box sets the visible extent only; it never changes where a
//! point lands, so hit-test thresholds stay in degrees.

use crate::bbox::BoundingBox;
use crate::types::{AircraftRecord, ProjectedPoint};

/// Project one coordinate pair.
pub fn project_point(longitude: f64, latitude: f64) -> ProjectedPoint {
    ProjectedPoint::new(longitude, latitude)
}

/// Project every record, preserving order and length.
pub fn project(records: &[AircraftRecord], _bbox: &BoundingBox) -> Vec<ProjectedPoint> {
    records
        .iter()
        .map(|r| project_point(r.longitude, r.latitude))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(lon: f64, lat: f64) -> AircraftRecord {
        AircraftRecord {
            icao_id: "abcdef".into(),
            callsign: None,
            origin_country: String::new(),
            time_position: None,
            last_contact: 0,
            longitude: lon,
            latitude: lat,
            baro_altitude: None,
            on_ground: false,
            velocity: None,
            true_track: None,
            vertical_rate: None,
            geo_altitude: None,
            squawk: None,
            position_source: None,
        }
    }

    #[test]
    fn test_identity_mapping() {
        let records = vec![record(-0.5, 51.5), record(2.0, 49.0), record(-8.25, 60.0)];
        let points = project(&records, &BoundingBox::default());
        assert_eq!(points.len(), 3);
        for (r, p) in records.iter().zip(&points) {
            assert_eq!(p.x, r.longitude);
            assert_eq!(p.y, r.latitude);
        }
    }

    #[test]
    fn test_bbox_does_not_alter_mapping() {
        let records = vec![record(100.0, -30.0)];
        let a = project(&records, &BoundingBox::default());
        let b = project(&records, &BoundingBox::create(90.0, 110.0, -40.0, -20.0).unwrap());
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty() {
        assert!(project(&[], &BoundingBox::default()).is_empty());
    }
}
