//! Nearest-aircraft lookup for pointer clicks.

use serde::Serialize;

use crate::types::ProjectedPoint;

/// Maximum click distance, in plot units (degrees), that still selects an
/// aircraft.
pub const DEFAULT_HIT_THRESHOLD: f64 = 0.25;

/// A selected point: its index in the projected list and the click distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Hit {
    pub index: usize,
    pub distance: f64,
}

/// Find the point nearest to `click`, if it lies within `threshold`.
///
/// Returns `None` for a missing or non-finite click, an empty point list,
/// or when the nearest point is farther than `threshold`. Ties go to the
/// lowest index.
pub fn nearest(
    click: Option<ProjectedPoint>,
    points: &[ProjectedPoint],
    threshold: f64,
) -> Option<Hit> {
    let click = click.filter(ProjectedPoint::is_finite)?;

    let mut best: Option<Hit> = None;
    for (index, point) in points.iter().enumerate() {
        let distance = click.distance_to(point);
        // Strict `<` keeps the earliest of equal distances.
        if best.map_or(true, |b| distance < b.distance) {
            best = Some(Hit { index, distance });
        }
    }

    best.filter(|hit| hit.distance <= threshold)
}
