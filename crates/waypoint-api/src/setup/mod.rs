//! Application setup and initialization

pub mod database;
pub mod routes;
pub mod server;
pub mod services;
pub mod storage;
pub mod validation;

use crate::state::AppState;
use anyhow::{Context, Result};
use std::sync::Arc;
use waypoint_core::Config;

/// Initialize the entire application
///
/// Storage and database are optional: when either is missing or unreachable
/// the server still starts and the endpoints needing it answer with a
/// configuration error.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    crate::telemetry::init_telemetry(config.environment());

    validation::validate_config(&config).context("Configuration validation failed")?;
    tracing::info!("Configuration loaded and validated successfully");

    let vote_options = database::setup_database(&config).await;
    let storage = storage::setup_storage(&config).await;

    let state = services::initialize_services(&config, vote_options, storage)?;

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
