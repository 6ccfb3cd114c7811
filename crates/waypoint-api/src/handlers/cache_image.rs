use crate::error::{ErrorResponse, HttpAppError};
use crate::handlers::required_url;
use crate::services::CacheOutcome;
use crate::state::IngestState;
use crate::utils::{validate_image_url, UrlRejection};
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use waypoint_core::constants::{CACHE_IMAGE_CACHE_CONTROL, NO_STORE};
use waypoint_core::models::{CacheImageResponse, ExternalUrlQuery};

/// Re-host an external image and return its stable public URL
///
/// Per-image failures (blocked target, upstream error, storage error) are
/// reported as `200 {error}` so the client can fall back to the original URL.
#[utoipa::path(
    get,
    path = "/api/cache-image",
    tag = "images",
    params(ExternalUrlQuery),
    responses(
        (status = 200, description = "Public URL of the re-hosted image, or a per-image error", body = CacheImageResponse),
        (status = 400, description = "Missing or malformed url", body = ErrorResponse),
        (status = 500, description = "Storage not configured", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(ingest, query), fields(url = ?query.url, operation = "cache_image"))]
pub async fn cache_image(
    State(ingest): State<IngestState>,
    Query(query): Query<ExternalUrlQuery>,
) -> Result<Response, HttpAppError> {
    let raw = required_url(query.url.as_deref())?;

    if let Err(rejection @ UrlRejection::Malformed(_)) = validate_image_url(raw) {
        return Err(rejection.into());
    }

    let rehoster = ingest.rehoster()?;

    let response = match rehoster.cache_external(raw, false).await {
        Ok(CacheOutcome::AlreadyStable) => hosted(raw.to_string()),
        Ok(CacheOutcome::Rehosted { public_url }) => hosted(public_url),
        Ok(CacheOutcome::WouldRehost) => {
            return Err(HttpAppError::from(anyhow::anyhow!(
                "re-host finished without storing the image"
            )))
        }
        Err(e) => {
            tracing::warn!(url = %raw, error = %e, "Failed to cache external image");
            (
                StatusCode::OK,
                [(header::CACHE_CONTROL, NO_STORE)],
                Json(CacheImageResponse::failed(e.to_string())),
            )
                .into_response()
        }
    };

    Ok(response)
}

fn hosted(public_url: String) -> Response {
    (
        StatusCode::OK,
        [(header::CACHE_CONTROL, CACHE_IMAGE_CACHE_CONTROL)],
        Json(CacheImageResponse::hosted(public_url)),
    )
        .into_response()
}
