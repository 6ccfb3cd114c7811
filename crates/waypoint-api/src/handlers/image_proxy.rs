use crate::error::{ErrorResponse, HttpAppError};
use crate::handlers::required_url;
use crate::state::IngestState;
use crate::utils::validate_image_url;
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use waypoint_core::constants::IMAGE_PROXY_CACHE_CONTROL;
use waypoint_core::models::ExternalUrlQuery;

/// Stream an external image through the server
#[utoipa::path(
    get,
    path = "/api/image-proxy",
    tag = "images",
    params(ExternalUrlQuery),
    responses(
        (status = 200, description = "Image bytes with the upstream content type", content_type = "image/*"),
        (status = 400, description = "Missing, malformed or blocked url", body = ErrorResponse),
        (status = 404, description = "Upstream returned a non-success status", body = ErrorResponse),
        (status = 413, description = "Image larger than the configured limit", body = ErrorResponse),
        (status = 415, description = "Upstream content is not an image", body = ErrorResponse),
        (status = 500, description = "Upstream request failed", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(ingest, query), fields(url = ?query.url, operation = "image_proxy"))]
pub async fn image_proxy(
    State(ingest): State<IngestState>,
    Query(query): Query<ExternalUrlQuery>,
) -> Result<Response, HttpAppError> {
    let raw = required_url(query.url.as_deref())?;
    let url = validate_image_url(raw)?;

    let image = ingest.fetcher.fetch_image(&url).await?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, image.content_type)],
        [(header::CACHE_CONTROL, IMAGE_PROXY_CACHE_CONTROL)],
        image.bytes,
    )
        .into_response())
}
