//! radar-core: the live radar engine.
//!
//! No async, no network I/O. Bounding-box validation, state-feed
//! normalization, projection, hit testing, and the refresh state machine.
//! `radar-server` supplies the HTTP transport and the front-end API.

pub mod bbox;
pub mod config;
pub mod controller;
pub mod hittest;
pub mod ingest;
pub mod projection;
pub mod registry;
pub mod render;
pub mod types;

// Re-export commonly used types at crate root
pub use bbox::{BoundingBox, BoundsInput};
pub use controller::{
    BoundsState, Phase, RadarController, RefreshOutcome, RefreshReport, RefreshTicket,
    SnapshotSource,
};
pub use hittest::{nearest, Hit, DEFAULT_HIT_THRESHOLD};
pub use registry::Registry;
pub use render::{InfoPanel, MapStyle, RenderFrame};
pub use types::*;
