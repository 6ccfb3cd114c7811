//! Re-hosting of external images into our own storage

use crate::services::fetcher::{FetchError, FetchedImage, ImageFetcher};
use crate::utils::ssrf_validation::{validate_image_url, UrlRejection};
use std::sync::Arc;
use url::Url;
use waypoint_core::constants::{CACHED_EXTERNAL_MARKER, STORED_OBJECT_CACHE_CONTROL};
use waypoint_storage::keys::{content_type_for_key, generate_cached_external_key};
use waypoint_storage::{Storage, StorageError};

#[derive(Debug, thiserror::Error)]
pub enum RehostError {
    #[error(transparent)]
    Rejected(#[from] UrlRejection),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Storage backend does not expose public URLs")]
    NoPublicUrl,
}

/// Result of caching one external image reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheOutcome {
    /// Reference already points at re-hosted content; nothing was fetched
    AlreadyStable,
    Rehosted { public_url: String },
    /// Dry run: the image was fetched and would have been stored
    WouldRehost,
}

/// Whether `url` already points at content served from our storage.
///
/// Under the public base means same origin and a path at or below the base
/// path on a segment boundary.
pub fn is_stable_url(url: &str, public_base_url: Option<&str>) -> bool {
    if url.contains(CACHED_EXTERNAL_MARKER) {
        return true;
    }
    match public_base_url.map(str::trim).filter(|b| !b.is_empty()) {
        Some(base) => is_under_base(url, base),
        None => false,
    }
}

fn is_under_base(url: &str, base: &str) -> bool {
    let (Ok(url), Ok(base)) = (Url::parse(url.trim()), Url::parse(base)) else {
        return false;
    };
    if url.origin() != base.origin() {
        return false;
    }

    let base_path = base.path().trim_end_matches('/');
    if base_path.is_empty() {
        return true;
    }
    url.path() == base_path
        || url
            .path()
            .strip_prefix(base_path)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Validate, fetch and store external images
#[derive(Clone)]
pub struct ImageRehoster {
    fetcher: Arc<dyn ImageFetcher>,
    storage: Arc<dyn Storage>,
}

impl ImageRehoster {
    pub fn new(fetcher: Arc<dyn ImageFetcher>, storage: Arc<dyn Storage>) -> Self {
        Self { fetcher, storage }
    }

    pub fn is_stable(&self, url: &str) -> bool {
        is_stable_url(url, self.storage.public_base_url().as_deref())
    }

    /// Bring one external image reference under our storage.
    ///
    /// Stable references short-circuit before any network access. With
    /// `dry_run` the image is still validated and fetched but never stored.
    #[tracing::instrument(skip(self), fields(operation = "cache_external"))]
    pub async fn cache_external(
        &self,
        raw_url: &str,
        dry_run: bool,
    ) -> Result<CacheOutcome, RehostError> {
        if self.is_stable(raw_url) {
            return Ok(CacheOutcome::AlreadyStable);
        }

        let url = validate_image_url(raw_url)?;
        let image = self.fetcher.fetch_image(&url).await?;

        if dry_run {
            return Ok(CacheOutcome::WouldRehost);
        }

        let public_url = self.rehost(image).await?;
        Ok(CacheOutcome::Rehosted { public_url })
    }

    /// Store fetched bytes under a fresh random key and return their public URL.
    ///
    /// The object is stored with the content type implied by the key's
    /// extension, so every backend serves it the same way. Types outside the
    /// extension table (e.g. `image/svg+xml`) are stored as `image/jpeg`.
    pub async fn rehost(&self, image: FetchedImage) -> Result<String, RehostError> {
        let key = generate_cached_external_key(&image.content_type);
        let stored_type = content_type_for_key(&key);
        let size = image.bytes.len();
        let public_url = self
            .storage
            .public_url(&key)
            .ok_or(RehostError::NoPublicUrl)?;

        self.storage
            .put_new(
                &key,
                image.bytes,
                stored_type,
                STORED_OBJECT_CACHE_CONTROL,
            )
            .await?;

        tracing::info!(
            key = %key,
            size_bytes = size,
            upstream_content_type = %image.content_type,
            content_type = %stored_type,
            "Re-hosted external image"
        );

        Ok(public_url)
    }
}
