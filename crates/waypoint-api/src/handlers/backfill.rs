use crate::auth::authorize_backfill;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use waypoint_core::constants::NO_STORE;
use waypoint_core::models::{BackfillParams, BackfillQuery, BackfillReport};
use waypoint_core::AppError;

/// Re-host external images of one page of a trip's vote options
///
/// Requires the backfill token (`x-backfill-token`, `Authorization: Bearer`
/// or `token` query parameter). Page through with `nextOffset` until it is null.
#[utoipa::path(
    get,
    path = "/api/backfill-vote-images",
    tag = "backfill",
    params(BackfillQuery),
    responses(
        (status = 200, description = "Page report", body = BackfillReport),
        (status = 400, description = "Missing tripId", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 500, description = "Token, database or storage not configured", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, headers, query), fields(trip_id = ?query.trip_id, operation = "backfill_vote_images"))]
pub async fn backfill_vote_images(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BackfillQuery>,
) -> Result<Response, HttpAppError> {
    authorize_backfill(
        state.security.backfill_token.as_deref(),
        &headers,
        query.token.as_deref(),
    )?;

    let trip_id = query
        .trip_id
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::InvalidInput("tripId query parameter is required".to_string()))?;

    let params = BackfillParams::new(
        trip_id.to_string(),
        query.limit.as_deref(),
        query.offset.as_deref(),
        query.dry_run.as_deref(),
    );

    let report = state.backfill_service()?.run_page(&params).await?;

    Ok((
        StatusCode::OK,
        [(header::CACHE_CONTROL, NO_STORE)],
        Json(report),
    )
        .into_response())
}
