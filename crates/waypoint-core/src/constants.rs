//! Shared constants for the image ingestion pipeline.

/// Key prefix for re-hosted external images.
pub const CACHED_EXTERNAL_PREFIX: &str = "cached/external/";

/// Path marker identifying a URL that already points at re-hosted content.
pub const CACHED_EXTERNAL_MARKER: &str = "/cached/external/";

/// Default upper bound for a fetched image (8 MiB).
pub const DEFAULT_IMAGE_MAX_BYTES: usize = 8 * 1024 * 1024;

/// Default upper bound for a fetched HTML page used for link previews.
pub const DEFAULT_LINK_PREVIEW_MAX_BYTES: usize = 2 * 1024 * 1024;

pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 15;

/// Redirect hops followed by the fetcher before giving up.
pub const MAX_REDIRECTS: usize = 5;

pub const BACKFILL_DEFAULT_LIMIT: i64 = 20;
pub const BACKFILL_MAX_LIMIT: i64 = 50;

/// Maximum number of per-item errors reported by one backfill page.
pub const BACKFILL_MAX_ERRORS: usize = 50;

/// Cache-Control stored alongside re-hosted objects.
pub const STORED_OBJECT_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

pub const IMAGE_PROXY_CACHE_CONTROL: &str = "public, max-age=86400, s-maxage=31536000, immutable";

pub const CACHE_IMAGE_CACHE_CONTROL: &str = "public, max-age=86400, s-maxage=604800";

pub const LINK_PREVIEW_CACHE_CONTROL: &str = "public, max-age=3600, s-maxage=86400";

pub const NO_STORE: &str = "no-store";

/// Browser-like User-Agent sent on outbound fetches. Some hosts refuse
/// requests without one.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

pub const IMAGE_ACCEPT: &str = "image/avif,image/webp,image/apng,image/*,*/*;q=0.8";

pub const HTML_ACCEPT: &str = "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8";

pub const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";
