//! Health check handlers and response types.

use crate::state::AppState;
use axum::{http::StatusCode, response::IntoResponse, Json};
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

const NOT_CONFIGURED: &str = "not_configured";

/// Run an async check with timeout; returns status string "healthy", "timeout", or "{prefix}: {error}".
async fn run_check<F, E>(timeout: Duration, f: F, error_prefix: &str) -> String
where
    F: Future<Output = Result<(), E>>,
    E: Display,
{
    match tokio::time::timeout(timeout, f).await {
        Ok(Ok(())) => "healthy".to_string(),
        Ok(Err(e)) => format!("{}: {}", error_prefix, e),
        Err(_) => "timeout".to_string(),
    }
}

#[derive(serde::Serialize)]
pub(super) struct HealthCheckResponse {
    pub status: String,
    pub database: String,
    pub storage: String,
}

/// Liveness probe - process is running.
pub async fn liveness_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": "alive" })),
    )
}

/// Health check over the optional storage and database collaborators.
///
/// A collaborator that is not configured is reported but does not make the
/// service unhealthy.
pub async fn health_check(state: Arc<AppState>) -> impl IntoResponse {
    const TIMEOUT: Duration = Duration::from_secs(5);

    let database = match state.db.vote_options.clone() {
        Some(store) => run_check(TIMEOUT, async move { store.ping().await }, "unhealthy").await,
        None => NOT_CONFIGURED.to_string(),
    };

    let storage = match state.ingest.storage.clone() {
        Some(storage) => {
            run_check(TIMEOUT, async move { storage.health_check().await }, "unhealthy").await
        }
        None => NOT_CONFIGURED.to_string(),
    };

    let is_ok = |s: &str| s == "healthy" || s == NOT_CONFIGURED;
    let overall_healthy = is_ok(&database) && is_ok(&storage);

    if !overall_healthy {
        tracing::warn!(database = %database, storage = %storage, "Health check failed");
    }

    let response = HealthCheckResponse {
        status: if overall_healthy { "healthy" } else { "unhealthy" }.to_string(),
        database,
        storage,
    };

    let status_code = if overall_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response))
}
