//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use waypoint_core::models;

/// Returns the OpenAPI spec served at `/api/openapi.json`.
pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Waypoint Image Ingestion API",
        version = "0.1.0",
        description = "Re-hosts external images referenced by trip content, proxies images, builds link previews and backfills stored vote option images. Outbound fetches refuse private, loopback and link-local targets."
    ),
    paths(
        handlers::cache_image::cache_image,
        handlers::image_proxy::image_proxy,
        handlers::link_preview::link_preview,
        handlers::backfill::backfill_vote_images,
    ),
    components(
        schemas(
            models::CacheImageResponse,
            models::LinkPreview,
            models::LinkPreviewResponse,
            models::BackfillReport,
            models::BackfillItemError,
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "images", description = "External image caching and proxying"),
        (name = "links", description = "Link preview metadata"),
        (name = "backfill", description = "Batch re-hosting of stored image references")
    )
)]
pub struct ApiDoc;
