use crate::error::{ErrorResponse, HttpAppError};
use crate::handlers::required_url;
use crate::services::extract_link_preview;
use crate::state::IngestState;
use crate::utils::{validate_image_url, UrlRejection};
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use waypoint_core::constants::{LINK_PREVIEW_CACHE_CONTROL, NO_STORE};
use waypoint_core::models::{ExternalUrlQuery, LinkPreviewResponse};

/// Title, description, image and site name of a web page
#[utoipa::path(
    get,
    path = "/api/link-preview",
    tag = "links",
    params(ExternalUrlQuery),
    responses(
        (status = 200, description = "Extracted metadata, or `{url, error}` when the page could not be read", body = LinkPreviewResponse),
        (status = 400, description = "Missing or malformed url", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(ingest, query), fields(url = ?query.url, operation = "link_preview"))]
pub async fn link_preview(
    State(ingest): State<IngestState>,
    Query(query): Query<ExternalUrlQuery>,
) -> Result<Response, HttpAppError> {
    let raw = required_url(query.url.as_deref())?;

    let url = match validate_image_url(raw) {
        Ok(url) => url,
        Err(rejection @ UrlRejection::Malformed(_)) => return Err(rejection.into()),
        Err(blocked) => return Ok(failed(raw, blocked.to_string())),
    };

    match ingest.fetcher.fetch_html(&url).await {
        Ok(page) => {
            let mut preview = extract_link_preview(&page.html, &page.final_url);
            preview.url = raw.to_string();
            Ok((
                StatusCode::OK,
                [(header::CACHE_CONTROL, LINK_PREVIEW_CACHE_CONTROL)],
                Json(LinkPreviewResponse::Preview(preview)),
            )
                .into_response())
        }
        Err(e) => {
            tracing::debug!(url = %raw, error = %e, "Link preview fetch failed");
            Ok(failed(raw, e.to_string()))
        }
    }
}

fn failed(url: &str, error: String) -> Response {
    (
        StatusCode::OK,
        [(header::CACHE_CONTROL, NO_STORE)],
        Json(LinkPreviewResponse::Failed {
            url: url.to_string(),
            error,
        }),
    )
        .into_response()
}
