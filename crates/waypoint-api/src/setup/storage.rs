//! Storage setup and initialization

use std::sync::Arc;
use waypoint_core::Config;
use waypoint_storage::{create_storage, Storage};

/// Build the configured storage backend, or `None` when it is not usable.
pub async fn setup_storage(config: &Config) -> Option<Arc<dyn Storage>> {
    tracing::info!("Initializing storage...");
    match create_storage(config).await {
        Ok(storage) => {
            tracing::info!(
                backend = %storage.backend_type(),
                public_base_url = ?storage.public_base_url(),
                "Storage initialized successfully"
            );
            Some(storage)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Storage not configured, re-hosting disabled");
            None
        }
    }
}
