//! Web server: axum JSON API for map front-ends.
//!
//! The front-end draws the base map and icons from `/api/frame`, forwards
//! pointer clicks to `/api/click`, and drives refreshes and viewport edits.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::live::LiveRadar;

pub mod routes;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

pub struct AppState {
    pub radar: Arc<LiveRadar>,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/frame", get(routes::api_frame))
        .route("/api/refresh", axum::routing::post(routes::api_refresh))
        .route(
            "/api/bounds",
            get(routes::api_bounds_get).post(routes::api_bounds_set),
        )
        .route("/api/click", get(routes::api_click))
        .route("/api/aircraft", get(routes::api_aircraft))
        .with_state(state)
        .layer(cors)
}

/// Start the web server. With `initial_refresh`, fetch once before listening.
pub async fn serve(
    radar: Arc<LiveRadar>,
    host: &str,
    port: u16,
    initial_refresh: bool,
) -> std::io::Result<()> {
    if initial_refresh {
        radar.refresh().await;
    }

    let app = build_router(Arc::new(AppState { radar }));
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!("radar API listening on http://{addr}");
    axum::serve(listener, app).await
}
