//! Waypoint API Library
//!
//! HTTP surface of the image ingestion pipeline: SSRF-safe URL validation,
//! guarded upstream fetching, re-hosting into object storage, link previews
//! and the vote option image backfill.

pub mod api_doc;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod setup;
pub mod state;
pub mod telemetry;
pub mod utils;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
