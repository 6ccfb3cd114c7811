//! Data models for the application
//!
//! Request and response shapes of the HTTP API and the database rows the
//! backfill reads and writes.

mod backfill;
mod image;
mod link_preview;
mod vote_option;

// Re-export all models for convenient imports
pub use backfill::*;
pub use image::*;
pub use link_preview::*;
pub use vote_option::*;
