//! Application state and sub-state extractors.
//!
//! Optional collaborators (storage, database) are `None` when not configured;
//! handlers that need them answer with a configuration error.

use crate::services::{BackfillService, ImageFetcher, ImageRehoster};
use std::sync::Arc;
use waypoint_core::AppError;
use waypoint_db::VoteOptionStore;
use waypoint_storage::Storage;

// ----- Sub-state types -----

/// Outbound fetching and re-hosting
#[derive(Clone)]
pub struct IngestState {
    pub fetcher: Arc<dyn ImageFetcher>,
    pub storage: Option<Arc<dyn Storage>>,
}

impl IngestState {
    /// Re-hoster over the configured storage backend
    pub fn rehoster(&self) -> Result<ImageRehoster, AppError> {
        let storage = self
            .storage
            .clone()
            .ok_or_else(|| AppError::Configuration("storage backend not configured".to_string()))?;
        Ok(ImageRehoster::new(self.fetcher.clone(), storage))
    }
}

/// Database-backed repositories
#[derive(Clone)]
pub struct DbState {
    pub vote_options: Option<Arc<dyn VoteOptionStore>>,
}

/// Shared secrets
#[derive(Clone)]
pub struct SecurityConfig {
    pub backfill_token: Option<String>,
}

// ----- AppState -----

/// Main application state: aggregates sub-states for dependency injection.
#[derive(Clone)]
pub struct AppState {
    pub ingest: IngestState,
    pub db: DbState,
    pub security: SecurityConfig,
}

impl AppState {
    pub fn backfill_service(&self) -> Result<BackfillService, AppError> {
        let store = self
            .db
            .vote_options
            .clone()
            .ok_or_else(|| AppError::Configuration("database not configured".to_string()))?;
        Ok(BackfillService::new(self.ingest.rehoster()?, store))
    }
}

// ----- FromRef for sub-state extraction -----

impl axum::extract::FromRef<Arc<AppState>> for IngestState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.ingest.clone()
    }
}

impl axum::extract::FromRef<Arc<AppState>> for DbState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.db.clone()
    }
}

fn _assert_app_state_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<AppState>();
    assert_sync::<AppState>();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{FetcherSettings, HttpImageFetcher};

    fn state(backfill_token: Option<&str>) -> AppState {
        let fetcher = HttpImageFetcher::new(FetcherSettings::default()).unwrap();
        AppState {
            ingest: IngestState {
                fetcher: Arc::new(fetcher),
                storage: None,
            },
            db: DbState { vote_options: None },
            security: SecurityConfig {
                backfill_token: backfill_token.map(String::from),
            },
        }
    }

    #[test]
    fn test_missing_collaborators_are_configuration_errors() {
        let state = state(Some("secret"));
        assert!(matches!(
            state.ingest.rehoster(),
            Err(AppError::Configuration(_))
        ));
        assert!(matches!(
            state.backfill_service(),
            Err(AppError::Configuration(_))
        ));
    }
}
