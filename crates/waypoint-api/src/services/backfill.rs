//! Backfill of vote option images
//!
//! Walks one page of a trip's vote options and re-hosts every external image
//! reference it finds, writing the new URLs back row by row.

use crate::services::rehost::{CacheOutcome, ImageRehoster};
use std::collections::HashSet;
use std::sync::Arc;
use waypoint_core::constants::BACKFILL_MAX_ERRORS;
use waypoint_core::models::{
    BackfillItemError, BackfillParams, BackfillReport, VoteOptionImageUpdate, VoteOptionImages,
};
use waypoint_core::AppError;
use waypoint_db::VoteOptionStore;

/// Placeholder url of errors raised by the row update itself
const DB_UPDATE_MARKER: &str = "(db update)";

#[derive(Clone)]
pub struct BackfillService {
    rehoster: ImageRehoster,
    store: Arc<dyn VoteOptionStore>,
}

impl BackfillService {
    pub fn new(rehoster: ImageRehoster, store: Arc<dyn VoteOptionStore>) -> Self {
        Self { rehoster, store }
    }

    /// Process one page. Per-item failures are collected in the report; only a
    /// failure to list the page aborts.
    #[tracing::instrument(
        skip(self),
        fields(
            operation = "backfill_vote_images",
            trip_id = %params.trip_id,
            limit = params.limit,
            offset = params.offset,
            dry_run = params.dry_run
        )
    )]
    pub async fn run_page(&self, params: &BackfillParams) -> Result<BackfillReport, AppError> {
        let rows = self
            .store
            .list_for_trip(&params.trip_id, params.limit, params.offset)
            .await?;

        let mut report = BackfillReport::default();

        for row in &rows {
            report.processed += 1;
            let update = self.process_row(row, params.dry_run, &mut report).await;

            if params.dry_run || update.is_empty() {
                continue;
            }

            match self.store.update_images(row.id, &update).await {
                Ok(()) => report.updated += 1,
                Err(e) => {
                    tracing::warn!(row_id = %row.id, error = %e, "Failed to update vote option images");
                    push_error(&mut report, row, DB_UPDATE_MARKER, e.to_string());
                }
            }
        }

        if rows.len() as i64 == params.limit {
            report.next_offset = Some(params.offset + params.limit);
        }

        tracing::info!(
            processed = report.processed,
            updated = report.updated,
            cached_count = report.cached_count,
            skipped_stable = report.skipped_stable,
            skipped_empty = report.skipped_empty,
            errors = report.errors.len(),
            "Backfill page completed"
        );

        Ok(report)
    }

    async fn process_row(
        &self,
        row: &VoteOptionImages,
        dry_run: bool,
        report: &mut BackfillReport,
    ) -> VoteOptionImageUpdate {
        let mut update = VoteOptionImageUpdate::default();

        match row.image_url.as_deref().map(str::trim) {
            None | Some("") => report.skipped_empty += 1,
            Some(url) => {
                if let Some(new_url) = self.cache_one(row, url, dry_run, report).await {
                    update.image_url = Some(new_url);
                }
            }
        }

        let original = row.photo_urls();
        let mut photos = Vec::with_capacity(original.len());
        for entry in original {
            let url = entry.trim();
            if url.is_empty() {
                photos.push(entry.clone());
                continue;
            }
            match self.cache_one(row, url, dry_run, report).await {
                Some(new_url) => photos.push(new_url),
                None => photos.push(entry.clone()),
            }
        }

        let photos = dedup_preserving_order(photos);
        if photos != original {
            update.photo_urls = Some(photos);
        }

        update
    }

    /// Cache one reference and return its replacement, if any.
    async fn cache_one(
        &self,
        row: &VoteOptionImages,
        url: &str,
        dry_run: bool,
        report: &mut BackfillReport,
    ) -> Option<String> {
        match self.rehoster.cache_external(url, dry_run).await {
            Ok(CacheOutcome::AlreadyStable) => {
                report.skipped_stable += 1;
                None
            }
            Ok(CacheOutcome::Rehosted { public_url }) => {
                report.cached_count += 1;
                Some(public_url)
            }
            Ok(CacheOutcome::WouldRehost) => {
                report.cached_count += 1;
                None
            }
            Err(e) => {
                tracing::debug!(row_id = %row.id, url = %url, error = %e, "Failed to cache image");
                push_error(report, row, url, e.to_string());
                None
            }
        }
    }
}

fn push_error(report: &mut BackfillReport, row: &VoteOptionImages, url: &str, error: String) {
    if report.errors.len() < BACKFILL_MAX_ERRORS {
        report.errors.push(BackfillItemError {
            row_id: row.id.to_string(),
            url: url.to_string(),
            error,
        });
    }
}

fn dedup_preserving_order(urls: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.into_iter()
        .filter(|url| seen.insert(url.clone()))
        .collect()
}
