pub mod backfill_token;

pub use backfill_token::{authorize_backfill, presented_token};
