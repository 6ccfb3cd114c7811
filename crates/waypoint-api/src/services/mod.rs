//! Ingestion services used by the HTTP handlers

pub mod backfill;
pub mod fetcher;
pub mod link_preview;
pub mod rehost;

pub use backfill::BackfillService;
pub use fetcher::{FetchError, FetcherSettings, HttpImageFetcher, ImageFetcher};
pub use link_preview::extract_link_preview;
pub use rehost::{is_stable_url, CacheOutcome, ImageRehoster, RehostError};
