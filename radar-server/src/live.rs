//! Async driver around the radar state machine.
//!
//! The controller sits behind a `std::sync::RwLock`. Every lock is taken
//! and released inside a plain block so no guard is alive across `.await`:
//! the fetch runs unlocked, and the registry swap happens in
//! `complete_refresh` under a single write lock.
//!
//! Each fetch cycle runs in its own task. A caller that stops waiting (a
//! dropped HTTP handler, a timeout) leaves the cycle running to completion,
//! so the controller always returns to `Idle`.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use radar_core::{
    BoundsInput, InfoPanel, IngestError, ProjectedPoint, RadarController, RefreshOutcome,
    RefreshTicket, ValidationError,
};

use crate::feed::SnapshotIngester;

pub struct LiveRadar {
    shared: Arc<Shared>,
}

struct Shared {
    controller: RwLock<RadarController>,
    ingester: SnapshotIngester,
}

impl Shared {
    fn read(&self) -> RwLockReadGuard<'_, RadarController> {
        self.controller
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RadarController> {
        self.controller
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    async fn run(&self, mut ticket: RefreshTicket) -> RefreshOutcome {
        loop {
            let result = self.ingester.fetch(ticket.bbox()).await;
            let report = {
                let mut radar = self.write();
                radar.complete_refresh(ticket, result)
            };
            match report.next {
                Some(next) => ticket = next,
                None => return report.outcome,
            }
        }
    }
}

impl LiveRadar {
    pub fn new(controller: RadarController, ingester: SnapshotIngester) -> Self {
        LiveRadar {
            shared: Arc::new(Shared {
                controller: RwLock::new(controller),
                ingester,
            }),
        }
    }

    /// Read access for snapshots, frames and clicks.
    pub fn read(&self) -> RwLockReadGuard<'_, RadarController> {
        self.shared.read()
    }

    #[cfg(test)]
    fn write(&self) -> RwLockWriteGuard<'_, RadarController> {
        self.shared.write()
    }

    /// Refresh for the current viewport.
    ///
    /// Returns `None` when another refresh is in flight; that refresh will
    /// run this request after it finishes.
    pub async fn refresh(&self) -> Option<RefreshOutcome> {
        let ticket = {
            let mut radar = self.shared.write();
            radar.begin_refresh()
        };
        match ticket {
            Some(ticket) => Some(self.drive(ticket).await),
            None => None,
        }
    }

    /// Commit a new viewport and refresh it. Validation errors leave the
    /// radar untouched.
    pub async fn edit_bounds(
        &self,
        candidate: BoundsInput,
    ) -> Result<Option<RefreshOutcome>, ValidationError> {
        let ticket = {
            let mut radar = self.shared.write();
            radar.request_bounds_edit(candidate)?
        };
        match ticket {
            Some(ticket) => Ok(Some(self.drive(ticket).await)),
            None => Ok(None),
        }
    }

    pub fn click(&self, click: Option<ProjectedPoint>) -> InfoPanel {
        self.read().handle_click(click)
    }

    async fn drive(&self, ticket: RefreshTicket) -> RefreshOutcome {
        let shared = Arc::clone(&self.shared);
        let cycle = tokio::spawn(async move { shared.run(ticket).await });
        match cycle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                log::error!("refresh task failed: {e}");
                self.shared.write().abandon_refresh();
                RefreshOutcome::Cleared {
                    error: IngestError::Network(format!("refresh task failed: {e}")),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use radar_core::{BoundingBox, Phase};
    use serde_json::json;
    use tokio::sync::Semaphore;

    use super::*;
    use crate::feed::testing::{state_row, StaticFeed};
    use crate::feed::StateFeed;

    fn live(feed: StaticFeed) -> (Arc<LiveRadar>, Arc<StaticFeed>) {
        let feed = Arc::new(feed);
        let radar = LiveRadar::new(
            RadarController::default(),
            SnapshotIngester::new(feed.clone()),
        );
        (Arc::new(radar), feed)
    }

    /// Holds every request until `open` is called, then serves one aircraft.
    struct GatedFeed {
        gate: Semaphore,
        calls: AtomicUsize,
    }

    impl GatedFeed {
        fn new() -> Self {
            GatedFeed {
                gate: Semaphore::new(0),
                calls: AtomicUsize::new(0),
            }
        }

        fn open(&self) {
            self.gate.add_permits(1);
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl StateFeed for GatedFeed {
        async fn get_states(&self, _bbox: &BoundingBox) -> Result<String, IngestError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let _permit = self
                .gate
                .acquire()
                .await
                .map_err(|e| IngestError::Network(e.to_string()))?;
            Ok(json!({"states": [state_row("400a0b", "BAW123", -0.5, 51.5, 90.0)]}).to_string())
        }
    }

    fn gated() -> (Arc<LiveRadar>, Arc<GatedFeed>) {
        let feed = Arc::new(GatedFeed::new());
        let radar = LiveRadar::new(
            RadarController::default(),
            SnapshotIngester::new(feed.clone()),
        );
        (Arc::new(radar), feed)
    }

    async fn wait_until(mut ready: impl FnMut() -> bool) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !ready() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    #[tokio::test]
    async fn test_refresh_and_click() {
        let (radar, _) = live(StaticFeed::body(json!({
            "states": [state_row("400a0b", "BAW123", -0.5, 51.5, 90.0)]
        })));

        let outcome = radar.refresh().await;
        assert_eq!(outcome, Some(RefreshOutcome::Applied { total_aircraft: 1 }));
        assert_eq!(radar.read().total_aircraft(), 1);
        assert_eq!(radar.read().phase(), Phase::Idle);

        let panel = radar.click(Some(ProjectedPoint::new(-0.5, 51.5)));
        assert_eq!(panel.values[0], "BAW123");
        assert!(radar.click(Some(ProjectedPoint::new(-5.0, 55.0))).is_empty());
    }

    #[tokio::test]
    async fn test_failed_refresh_clears() {
        let (radar, _) = live(StaticFeed::new(vec![
            Ok(json!({"states": [state_row("400a0b", "BAW123", -0.5, 51.5, 90.0)]}).to_string()),
            Err(IngestError::Network("connection reset".into())),
        ]));
        radar.refresh().await;
        assert_eq!(radar.read().total_aircraft(), 1);

        let outcome = radar.refresh().await.unwrap();
        assert!(matches!(outcome, RefreshOutcome::Cleared { .. }));
        assert_eq!(radar.read().total_aircraft(), 0);
    }

    #[tokio::test]
    async fn test_edit_bounds_fetches_new_box() {
        let (radar, feed) = live(StaticFeed::body(json!({"states": null})));
        let candidate = BoundsInput {
            lon_min: -1.0,
            lon_max: 1.0,
            lat_min: 50.0,
            lat_max: 52.0,
        };
        radar.edit_bounds(candidate).await.unwrap();

        let requested = feed.requested.lock().unwrap().clone();
        assert_eq!(requested, vec![BoundingBox::try_from(candidate).unwrap()]);
        assert_eq!(*radar.read().bbox(), requested[0]);
    }

    #[tokio::test]
    async fn test_invalid_edit_does_not_fetch() {
        let (radar, feed) = live(StaticFeed::body(json!({"states": null})));
        let err = radar
            .edit_bounds(BoundsInput {
                lon_min: 1.0,
                lon_max: -1.0,
                lat_min: 50.0,
                lat_max: 52.0,
            })
            .await;
        assert!(err.is_err());
        assert!(feed.requested.lock().unwrap().is_empty());
        assert_eq!(*radar.read().bbox(), BoundingBox::default());
    }

    #[tokio::test]
    async fn test_refresh_while_refreshing_is_coalesced() {
        let (radar, _) = live(StaticFeed::body(json!({"states": []})));
        let ticket = radar.write().begin_refresh().unwrap();

        assert_eq!(radar.refresh().await, None);

        // Completing the in-flight ticket runs the coalesced request.
        let outcome = radar.drive(ticket).await;
        assert!(matches!(outcome, RefreshOutcome::Cleared { .. }));
        assert_eq!(radar.read().phase(), Phase::Idle);
        assert_eq!(radar.read().refreshes_failed, 2);
    }

    #[tokio::test]
    async fn test_concurrent_refreshes_share_one_cycle() {
        let (radar, feed) = gated();

        let (first, second) = tokio::join!(radar.refresh(), async {
            wait_until(|| feed.calls() == 1).await;
            let second = radar.refresh().await;
            feed.open();
            second
        });

        assert_eq!(second, None);
        assert_eq!(first, Some(RefreshOutcome::Applied { total_aircraft: 1 }));
        // The coalesced request ran as one follow-up fetch.
        assert_eq!(feed.calls(), 2);
        assert_eq!(radar.read().refreshes_applied, 2);
        assert_eq!(radar.read().phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn test_dropped_refresh_still_completes() {
        let (radar, feed) = gated();

        let waited = tokio::time::timeout(Duration::from_millis(50), radar.refresh()).await;
        assert!(waited.is_err());
        assert_eq!(feed.calls(), 1);
        assert_eq!(radar.read().phase(), Phase::Refreshing);

        feed.open();
        wait_until(|| radar.read().phase() == Phase::Idle).await;
        assert_eq!(radar.read().total_aircraft(), 1);

        let outcome = radar.refresh().await;
        assert_eq!(outcome, Some(RefreshOutcome::Applied { total_aircraft: 1 }));
        assert_eq!(feed.calls(), 2);
    }
}
