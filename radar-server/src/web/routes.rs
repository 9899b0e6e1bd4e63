//! REST API route handlers.
//!
//! Handlers copy what they need out of the controller under a short read
//! lock; refreshes and viewport edits go through `LiveRadar`, which never
//! holds the lock across the feed request.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use radar_core::{BoundsInput, InfoPanel, ProjectedPoint, RadarController, RefreshOutcome};

use crate::web::AppState;

// ---------------------------------------------------------------------------
// Query param types
// ---------------------------------------------------------------------------

/// Click coordinates arrive as raw strings so a click outside the plot
/// (empty or non-numeric) degrades to "no selection" instead of a 400.
#[derive(Deserialize)]
pub struct ClickParams {
    x: Option<String>,
    y: Option<String>,
}

impl ClickParams {
    fn point(&self) -> Option<ProjectedPoint> {
        let parse = |v: &Option<String>| v.as_deref()?.trim().parse::<f64>().ok();
        Some(ProjectedPoint::new(parse(&self.x)?, parse(&self.y)?))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn outcome_json(outcome: Option<&RefreshOutcome>) -> Value {
    match outcome {
        None => json!({"status": "coalesced"}),
        Some(o @ RefreshOutcome::Applied { total_aircraft }) => {
            json!({"status": o.label(), "total_aircraft": total_aircraft})
        }
        Some(o @ RefreshOutcome::Cleared { error }) => json!({
            "status": o.label(),
            "reason": error.reason(),
            "detail": error.to_string(),
        }),
        Some(o @ RefreshOutcome::Stale) => json!({"status": o.label()}),
    }
}

fn frame_json(radar: &RadarController) -> Value {
    json!({
        "phase": radar.phase(),
        "bounds_state": radar.bounds_state(),
        "frame": radar.render_frame(),
        "counters": {
            "applied": radar.refreshes_applied,
            "failed": radar.refreshes_failed,
            "discarded": radar.refreshes_discarded,
        },
    })
}

fn panel_json(panel: &InfoPanel) -> Value {
    json!({
        "hit": panel.hit,
        "icao_id": panel.icao_id,
        "lines": panel.lines(),
        "text": panel.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Frame + refresh
// ---------------------------------------------------------------------------

/// GET /api/frame — icon placements, base-map style, and total count.
pub async fn api_frame(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(frame_json(&state.radar.read()))
}

/// POST /api/refresh — fetch a new snapshot for the current viewport.
pub async fn api_refresh(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let outcome = state.radar.refresh().await;
    let mut body = frame_json(&state.radar.read());
    body["refresh"] = outcome_json(outcome.as_ref());
    Json(body)
}

// ---------------------------------------------------------------------------
// Bounds
// ---------------------------------------------------------------------------

/// GET /api/bounds — current viewport.
pub async fn api_bounds_get(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let bbox = *state.radar.read().bbox();
    Json(json!(bbox))
}

/// POST /api/bounds — validate, commit, and refresh a new viewport.
pub async fn api_bounds_set(
    State(state): State<Arc<AppState>>,
    Json(candidate): Json<BoundsInput>,
) -> impl IntoResponse {
    match state.radar.edit_bounds(candidate).await {
        Ok(outcome) => {
            let mut body = frame_json(&state.radar.read());
            body["refresh"] = outcome_json(outcome.as_ref());
            (StatusCode::OK, Json(body))
        }
        Err(e) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "error": e.to_string(),
                "bounds": state.radar.read().bbox(),
            })),
        ),
    }
}

// ---------------------------------------------------------------------------
// Pointer + registry
// ---------------------------------------------------------------------------

/// GET /api/click?x=&y= — info panel for the aircraft nearest the click.
pub async fn api_click(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ClickParams>,
) -> impl IntoResponse {
    let panel = state.radar.click(params.point());
    Json(panel_json(&panel))
}

/// GET /api/aircraft — records of the current snapshot, in index order.
pub async fn api_aircraft(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let registry = state.radar.read().registry();
    Json(json!(registry.records()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
