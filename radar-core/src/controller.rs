//! Radar state machine: viewport, refresh cycle, and click handling.
//!
//! Pure logic. The network fetch happens between [`RadarController::begin_refresh`]
//! and [`RadarController::complete_refresh`], outside whatever lock the caller
//! keeps the controller behind. [`RadarController::refresh`] runs the whole
//! cycle synchronously against a [`SnapshotSource`].
//!
//! Invariants:
//! - at most one refresh in flight; requests made meanwhile collapse into a
//!   single pending refresh
//! - a refresh started before a bounds edit is discarded when it completes
//! - the registry is swapped in one assignment, never edited in place

use std::sync::Arc;

use serde::Serialize;

use crate::bbox::{BoundingBox, BoundsInput};
use crate::hittest::DEFAULT_HIT_THRESHOLD;
use crate::registry::Registry;
use crate::render::{InfoPanel, MapStyle, RenderFrame};
use crate::types::{AircraftRecord, IngestError, ProjectedPoint, ValidationError};

/// Anything that can produce a snapshot for a bounding box.
pub trait SnapshotSource {
    fn fetch(&mut self, bbox: &BoundingBox) -> Result<Vec<AircraftRecord>, IngestError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Refreshing,
}

/// Whether the registry reflects the current viewport yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundsState {
    Stable,
    /// A new box is committed but no refresh for it has completed.
    PendingEdit,
}

/// Permission to run one fetch. Returned to `complete_refresh` with the result.
#[derive(Debug)]
pub struct RefreshTicket {
    bbox: BoundingBox,
    generation: u64,
}

impl RefreshTicket {
    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// Registry replaced with a fresh snapshot.
    Applied { total_aircraft: usize },
    /// Fetch failed; registry cleared.
    Cleared { error: IngestError },
    /// Viewport changed while the fetch was in flight; result dropped.
    Stale,
}

impl RefreshOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            RefreshOutcome::Applied { .. } => "applied",
            RefreshOutcome::Cleared { .. } => "cleared",
            RefreshOutcome::Stale => "stale",
        }
    }
}

#[derive(Debug)]
pub struct RefreshReport {
    pub outcome: RefreshOutcome,
    /// Set when a coalesced request must run next.
    pub next: Option<RefreshTicket>,
}

pub struct RadarController {
    bbox: BoundingBox,
    bounds_state: BoundsState,
    generation: u64,
    phase: Phase,
    refresh_pending: bool,
    registry: Arc<Registry>,
    threshold: f64,
    style: MapStyle,

    // Counters
    pub refreshes_applied: u64,
    pub refreshes_failed: u64,
    pub refreshes_discarded: u64,
}

impl RadarController {
    pub fn new(bbox: BoundingBox, threshold: f64, style: MapStyle) -> Self {
        RadarController {
            bbox,
            bounds_state: BoundsState::Stable,
            generation: 0,
            phase: Phase::Idle,
            refresh_pending: false,
            registry: Arc::new(Registry::empty()),
            threshold,
            style,
            refreshes_applied: 0,
            refreshes_failed: 0,
            refreshes_discarded: 0,
        }
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn bounds_state(&self) -> BoundsState {
        self.bounds_state
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Shared handle to the current snapshot. Stays valid after later swaps.
    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.registry)
    }

    pub fn total_aircraft(&self) -> usize {
        self.registry.len()
    }

    /// Validate and commit a new viewport, then request a refresh for it.
    ///
    /// On error nothing changes. On success the returned ticket (if any)
    /// must be fetched and completed; `None` means a refresh is already in
    /// flight and the new box will be fetched after it.
    pub fn request_bounds_edit(
        &mut self,
        candidate: BoundsInput,
    ) -> Result<Option<RefreshTicket>, ValidationError> {
        let next = match BoundingBox::replace(&self.bbox, candidate) {
            Ok(b) => b,
            Err(e) => {
                log::warn!("rejected bounds edit: {e}");
                return Err(e);
            }
        };

        self.bounds_state = BoundsState::PendingEdit;
        self.bbox = next;
        self.generation += 1;
        self.registry = Arc::new(self.registry.reproject(&next));
        log::info!("viewport set to {next}");

        Ok(self.begin_refresh())
    }

    /// Move to `Refreshing` and hand out a ticket, or record a pending
    /// request if a refresh is already running.
    pub fn begin_refresh(&mut self) -> Option<RefreshTicket> {
        if self.phase == Phase::Refreshing {
            if !self.refresh_pending {
                log::debug!("refresh in flight, coalescing request");
            }
            self.refresh_pending = true;
            return None;
        }
        self.phase = Phase::Refreshing;
        Some(RefreshTicket {
            bbox: self.bbox,
            generation: self.generation,
        })
    }

    /// Apply (or discard) a fetch result and return to `Idle`.
    ///
    /// If requests arrived during the fetch, the report carries the ticket
    /// for the follow-up refresh and the phase stays `Refreshing`.
    pub fn complete_refresh(
        &mut self,
        ticket: RefreshTicket,
        result: Result<Vec<AircraftRecord>, IngestError>,
    ) -> RefreshReport {
        let outcome = if ticket.generation != self.generation {
            log::debug!(
                "discarding refresh for superseded viewport {}",
                ticket.bbox
            );
            self.refreshes_discarded += 1;
            RefreshOutcome::Stale
        } else {
            self.bounds_state = BoundsState::Stable;
            match result {
                Ok(records) => {
                    self.registry = Arc::new(Registry::from_records(records, &self.bbox));
                    self.refreshes_applied += 1;
                    log::info!("radar refreshed: {} aircraft", self.registry.len());
                    RefreshOutcome::Applied {
                        total_aircraft: self.registry.len(),
                    }
                }
                Err(error) => {
                    self.registry = Arc::new(Registry::empty());
                    self.refreshes_failed += 1;
                    log::warn!("radar cleared ({}): {error}", error.reason());
                    RefreshOutcome::Cleared { error }
                }
            }
        };

        self.phase = Phase::Idle;
        let next = if std::mem::take(&mut self.refresh_pending) {
            self.begin_refresh()
        } else {
            None
        };

        RefreshReport { outcome, next }
    }

    /// Return to `Idle` after the in-flight ticket was lost without being
    /// completed. The registry is kept, any coalesced request is dropped, and
    /// a straggling result for the lost ticket would be discarded as stale.
    pub fn abandon_refresh(&mut self) {
        if self.phase != Phase::Refreshing {
            return;
        }
        log::warn!("refresh for {} abandoned", self.bbox);
        self.generation += 1;
        self.refresh_pending = false;
        self.phase = Phase::Idle;
    }

    /// Run a full refresh cycle against `source`, including any follow-up
    /// refresh requested while it ran. Returns the last outcome, or `None`
    /// if a refresh was already in flight.
    pub fn refresh<S: SnapshotSource>(&mut self, source: &mut S) -> Option<RefreshOutcome> {
        let ticket = self.begin_refresh()?;
        Some(self.drive(ticket, source))
    }

    /// Edit the viewport and refresh synchronously.
    pub fn edit_bounds_and_refresh<S: SnapshotSource>(
        &mut self,
        candidate: BoundsInput,
        source: &mut S,
    ) -> Result<Option<RefreshOutcome>, ValidationError> {
        Ok(self
            .request_bounds_edit(candidate)?
            .map(|ticket| self.drive(ticket, source)))
    }

    fn drive<S: SnapshotSource>(&mut self, mut ticket: RefreshTicket, source: &mut S) -> RefreshOutcome {
        loop {
            let result = source.fetch(&ticket.bbox);
            let report = self.complete_refresh(ticket, result);
            match report.next {
                Some(next) => ticket = next,
                None => return report.outcome,
            }
        }
    }

    /// Resolve a click to the info panel text.
    pub fn handle_click(&self, click: Option<ProjectedPoint>) -> InfoPanel {
        match self.registry.nearest(click, self.threshold) {
            Some((hit, record)) => InfoPanel::for_record(hit, record),
            None => InfoPanel::empty(),
        }
    }

    pub fn render_frame(&self) -> RenderFrame {
        RenderFrame::build(self.bbox, &self.style, &self.registry)
    }
}

impl Default for RadarController {
    fn default() -> Self {
        RadarController::new(
            BoundingBox::default(),
            DEFAULT_HIT_THRESHOLD,
            MapStyle::default(),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
