//! HTTP handlers

pub mod backfill;
pub mod cache_image;
pub mod image_proxy;
pub mod link_preview;
pub mod stored_object;

use waypoint_core::AppError;

/// Trimmed `url` query parameter, or 400 when missing or blank.
pub(crate) fn required_url(url: Option<&str>) -> Result<&str, AppError> {
    url.map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| AppError::InvalidInput("url query parameter is required".to_string()))
}
