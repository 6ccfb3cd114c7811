//! Service initialization and application state setup

use crate::services::{FetcherSettings, HttpImageFetcher};
use crate::state::{AppState, DbState, IngestState, SecurityConfig};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use waypoint_core::Config;
use waypoint_db::VoteOptionStore;
use waypoint_storage::Storage;

/// Initialize all services, returning the application state
pub fn initialize_services(
    config: &Config,
    vote_options: Option<Arc<dyn VoteOptionStore>>,
    storage: Option<Arc<dyn Storage>>,
) -> Result<Arc<AppState>> {
    let settings = FetcherSettings {
        timeout: Duration::from_secs(config.image_fetch_timeout_secs()),
        image_max_bytes: config.image_max_bytes(),
        page_max_bytes: config.link_preview_max_bytes(),
        guard_resolved_addrs: config.ssrf_guard_resolved_addrs(),
    };

    if !settings.guard_resolved_addrs {
        tracing::warn!("SSRF resolution guard disabled - only use this for local testing");
    }

    let fetcher = HttpImageFetcher::new(settings.clone())?;
    tracing::info!(
        timeout_secs = settings.timeout.as_secs(),
        image_max_bytes = settings.image_max_bytes,
        page_max_bytes = settings.page_max_bytes,
        "Upstream fetcher initialized"
    );

    if config.backfill_token().is_none() {
        tracing::warn!("BACKFILL_TOKEN not set, backfill endpoint disabled");
    }

    Ok(Arc::new(AppState {
        ingest: IngestState {
            fetcher: Arc::new(fetcher),
            storage,
        },
        db: DbState { vote_options },
        security: SecurityConfig {
            backfill_token: config.backfill_token().map(String::from),
        },
    }))
}
