//! Upstream stand-in keyed on the URL path.

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicUsize, Ordering};
use url::Url;
use waypoint_api::services::fetcher::{FetchedImage, FetchedPage};
use waypoint_api::services::{FetchError, ImageFetcher};

pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nstub";

/// Path fragments select the upstream behavior:
/// `broken` → 404, `page` → HTML, `huge` → over the size limit,
/// `/article` → link preview page, anything else → a PNG.
#[derive(Default)]
pub struct StubFetcher {
    calls: AtomicUsize,
}

impl StubFetcher {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

const ARTICLE_HTML: &str = r#"<!doctype html>
<html><head>
<title>Tag title</title>
<script type="application/ld+json">
{"@context":"https://schema.org","@type":"Article","headline":"Sintra day trip",
 "description":"Palaces and fog","image":{"url":"/media/sintra.jpg"},
 "publisher":{"@type":"Organization","name":"Trip Notes"}}
</script>
</head><body></body></html>"#;

#[async_trait]
impl ImageFetcher for StubFetcher {
    async fn fetch_image(&self, url: &Url) -> Result<FetchedImage, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let path = url.path();
        if path.contains("broken") {
            return Err(FetchError::UpstreamStatus(404));
        }
        if path.contains("page") {
            return Err(FetchError::NotAnImage("text/html; charset=utf-8".to_string()));
        }
        if path.contains("huge") {
            return Err(FetchError::TooLarge { limit: 8 * 1024 * 1024 });
        }
        Ok(FetchedImage {
            bytes: Bytes::from_static(PNG_BYTES),
            content_type: "image/png".to_string(),
        })
    }

    async fn fetch_html(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if url.path().starts_with("/article") {
            return Ok(FetchedPage {
                final_url: url.clone(),
                html: ARTICLE_HTML.to_string(),
            });
        }
        Err(FetchError::UpstreamStatus(404))
    }
}
