use crate::error::HttpAppError;
use crate::state::IngestState;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use waypoint_core::constants::STORED_OBJECT_CACHE_CONTROL;
use waypoint_core::AppError;
use waypoint_storage::keys::content_type_for_key;

/// Serve a re-hosted object from the local storage backend.
#[tracing::instrument(skip(ingest), fields(operation = "stored_object"))]
pub async fn stored_object(
    State(ingest): State<IngestState>,
    Path(key): Path<String>,
) -> Result<Response, HttpAppError> {
    let storage = ingest
        .storage
        .ok_or_else(|| AppError::Configuration("storage backend not configured".to_string()))?;

    let stream = storage.download_stream(&key).await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type_for_key(&key)),
            (header::CACHE_CONTROL, STORED_OBJECT_CACHE_CONTROL),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}
