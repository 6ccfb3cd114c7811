//! Configuration validation
//!
//! Validates critical configuration values at startup to catch misconfigurations early.

use anyhow::Result;
use waypoint_core::{Config, StorageBackend};

/// Validate critical configuration values
///
/// Fails on settings that are unsafe or cannot work; only warns about
/// missing optional collaborators.
pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    let is_production = config.is_production();

    if is_production && config.cors_origins().iter().any(|o| o == "*") {
        return Err(anyhow::anyhow!(
            "CORS configured to allow all origins (*) in production - \
            set specific allowed origins via CORS_ORIGINS"
        ));
    }

    if config.db_max_connections() == 0 {
        return Err(anyhow::anyhow!("Database max connections cannot be 0"));
    }

    if config.db_timeout_seconds() == 0 {
        return Err(anyhow::anyhow!("Database timeout cannot be 0"));
    }

    if config.request_timeout_secs() < config.image_fetch_timeout_secs() {
        tracing::warn!(
            request_timeout_secs = config.request_timeout_secs(),
            fetch_timeout_secs = config.image_fetch_timeout_secs(),
            "Request timeout is shorter than the upstream fetch timeout"
        );
    }

    if is_production && !config.ssrf_guard_resolved_addrs() {
        return Err(anyhow::anyhow!(
            "SSRF_GUARD_RESOLVED_ADDRS cannot be disabled in production"
        ));
    }

    if let Some(token) = config.backfill_token() {
        if is_production && token.len() < 16 {
            tracing::warn!("BACKFILL_TOKEN is shorter than 16 characters");
        }
    }

    if config.storage_backend() == Some(StorageBackend::Local)
        && config.local_storage_base_url().is_none()
        && config.storage_public_base_url().is_none()
    {
        tracing::warn!(
            "Local storage without LOCAL_STORAGE_BASE_URL - re-hosted images will have no public URL"
        );
    }

    tracing::info!("Configuration validation passed");
    Ok(())
}
