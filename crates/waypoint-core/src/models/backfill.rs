use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::constants::{BACKFILL_DEFAULT_LIMIT, BACKFILL_MAX_LIMIT};

/// Raw query string of the backfill endpoint.
///
/// Numeric fields are kept as strings so that junk values fall back to
/// defaults instead of failing extraction.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct BackfillQuery {
    pub trip_id: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub dry_run: Option<String>,
    /// Shared secret, alternative to the `x-backfill-token` header
    pub token: Option<String>,
}

/// Validated paging parameters for one backfill page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackfillParams {
    pub trip_id: String,
    pub limit: i64,
    pub offset: i64,
    pub dry_run: bool,
}

impl BackfillParams {
    /// Build paging parameters. `limit` is clamped to `[1, 50]` (default 20),
    /// `offset` defaults to 0 and never goes negative.
    pub fn new(trip_id: String, limit: Option<&str>, offset: Option<&str>, dry_run: Option<&str>) -> Self {
        let limit = limit
            .and_then(|v| v.trim().parse::<i64>().ok())
            .unwrap_or(BACKFILL_DEFAULT_LIMIT)
            .clamp(1, BACKFILL_MAX_LIMIT);
        let offset = offset
            .and_then(|v| v.trim().parse::<i64>().ok())
            .unwrap_or(0)
            .max(0);
        let dry_run = dry_run
            .map(|v| matches!(v.trim().to_lowercase().as_str(), "" | "1" | "true" | "yes"))
            .unwrap_or(false);

        Self {
            trip_id,
            limit,
            offset,
            dry_run,
        }
    }
}

/// One failed item of a backfill page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BackfillItemError {
    pub row_id: String,
    pub url: String,
    pub error: String,
}

/// Summary of one backfill page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BackfillReport {
    pub processed: usize,
    pub updated: usize,
    pub cached_count: usize,
    pub skipped_stable: usize,
    pub skipped_empty: usize,
    pub errors: Vec<BackfillItemError>,
    /// Offset of the next page, present only when this page was full
    pub next_offset: Option<i64>,
}
