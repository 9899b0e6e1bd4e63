//! The current snapshot: aircraft records and their projected positions.
//!
//! Records and points are built together and never modified afterwards, so
//! `points()[i]` is always the projection of `records()[i]`. A refresh
//! installs a whole new `Registry` rather than editing this one.

use serde::Serialize;

use crate::bbox::BoundingBox;
use crate::hittest::{self, Hit};
use crate::projection;
use crate::types::{AircraftRecord, ProjectedPoint};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Registry {
    records: Vec<AircraftRecord>,
    points: Vec<ProjectedPoint>,
}

impl Registry {
    pub fn empty() -> Self {
        Registry::default()
    }

    /// Take ownership of a snapshot and project it under `bbox`.
    pub fn from_records(records: Vec<AircraftRecord>, bbox: &BoundingBox) -> Self {
        let points = projection::project(&records, bbox);
        Registry { records, points }
    }

    /// Same records, projections recomputed for a new viewport.
    pub fn reproject(&self, bbox: &BoundingBox) -> Self {
        Registry::from_records(self.records.clone(), bbox)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[AircraftRecord] {
        &self.records
    }

    pub fn points(&self) -> &[ProjectedPoint] {
        &self.points
    }

    pub fn get(&self, index: usize) -> Option<(&AircraftRecord, &ProjectedPoint)> {
        Some((self.records.get(index)?, self.points.get(index)?))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AircraftRecord, &ProjectedPoint)> {
        self.records.iter().zip(&self.points)
    }

    /// Hit-test a click and resolve the record it selected.
    pub fn nearest(
        &self,
        click: Option<ProjectedPoint>,
        threshold: f64,
    ) -> Option<(Hit, &AircraftRecord)> {
        let hit = hittest::nearest(click, &self.points, threshold)?;
        self.records.get(hit.index).map(|r| (hit, r))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn record(icao: &str, callsign: &str, lon: f64, lat: f64) -> AircraftRecord {
        AircraftRecord {
            icao_id: icao.into(),
            callsign: (!callsign.is_empty()).then(|| callsign.to_string()),
            origin_country: "United Kingdom".into(),
            time_position: Some(1700000000),
            last_contact: 1700000000,
            longitude: lon,
            latitude: lat,
            baro_altitude: Some(10000.0),
            on_ground: false,
            velocity: Some(220.0),
            true_track: Some(90.0),
            vertical_rate: None,
            geo_altitude: None,
            squawk: None,
            position_source: Some(0),
        }
    }

    #[test]
    fn test_parallel_indexing() {
        let records = vec![
            record("aaaaaa", "A1", -1.0, 50.0),
            record("bbbbbb", "B2", 0.0, 51.0),
            record("cccccc", "C3", 1.0, 52.0),
        ];
        let reg = Registry::from_records(records, &BoundingBox::default());
        assert_eq!(reg.len(), 3);
        assert_eq!(reg.points().len(), reg.records().len());
        for (r, p) in reg.iter() {
            assert_eq!((p.x, p.y), (r.longitude, r.latitude));
        }
        let (r, p) = reg.get(1).unwrap();
        assert_eq!(r.icao_id, "bbbbbb");
        assert_eq!(p.x, 0.0);
        assert!(reg.get(3).is_none());
    }

    #[test]
    fn test_nearest_resolves_record() {
        let reg = Registry::from_records(
            vec![record("aaaaaa", "A1", -1.0, 50.0), record("bbbbbb", "B2", 0.0, 51.0)],
            &BoundingBox::default(),
        );
        let (hit, r) = reg
            .nearest(Some(ProjectedPoint::new(0.05, 51.0)), 0.25)
            .unwrap();
        assert_eq!(hit.index, 1);
        assert_eq!(r.callsign.as_deref(), Some("B2"));
        assert!(reg.nearest(Some(ProjectedPoint::new(5.0, 5.0)), 0.25).is_none());
    }

    #[test]
    fn test_projection_roundtrip_through_hit_test() {
        let records: Vec<_> = (0..10)
            .map(|i| record(&format!("{i:06x}"), "", -10.0 + i as f64, 50.0 + i as f64 * 0.5))
            .collect();
        let reg = Registry::from_records(records, &BoundingBox::default());
        for k in 0..reg.len() {
            let (hit, r) = reg.nearest(Some(reg.points()[k]), 0.25).unwrap();
            assert_eq!(hit.index, k);
            assert_eq!(hit.distance, 0.0);
            assert_eq!(r.icao_id, format!("{k:06x}"));
        }
    }

    #[test]
    fn test_empty_registry() {
        let reg = Registry::empty();
        assert!(reg.is_empty());
        assert!(reg.nearest(Some(ProjectedPoint::new(0.0, 0.0)), 0.25).is_none());
    }
}
