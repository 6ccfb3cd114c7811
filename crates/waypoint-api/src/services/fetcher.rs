//! Outbound HTTP fetches of user-supplied URLs
//!
//! Every URL reaching this module has already passed `validate_image_url`.
//! With the resolution guard on, the client additionally refuses to connect to
//! hostnames resolving into blocked ranges and re-validates redirect targets.

use crate::utils::ssrf_validation::{is_private_ip, validate_image_url, UrlRejection};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_LENGTH, CONTENT_TYPE, REFERER, USER_AGENT};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use waypoint_core::constants::{
    ACCEPT_LANGUAGE as ACCEPT_LANGUAGE_VALUE, BROWSER_USER_AGENT, DEFAULT_FETCH_TIMEOUT_SECS,
    DEFAULT_IMAGE_MAX_BYTES, DEFAULT_LINK_PREVIEW_MAX_BYTES, HTML_ACCEPT, IMAGE_ACCEPT,
    MAX_REDIRECTS,
};

/// Image body and its declared content type
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub bytes: Bytes,
    pub content_type: String,
}

/// HTML document and the URL it was finally served from
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub final_url: Url,
    pub html: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("Upstream returned status {0}")]
    UpstreamStatus(u16),

    #[error("Upstream content is not an image: {0}")]
    NotAnImage(String),

    #[error("Upstream content is not HTML: {0}")]
    NotHtml(String),

    #[error("Upstream response exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("Blocked upstream target: {0}")]
    Blocked(UrlRejection),

    #[error("Upstream request timed out")]
    Timeout,

    #[error("Upstream request failed: {0}")]
    Request(String),
}

/// Source of upstream images and pages
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch_image(&self, url: &Url) -> Result<FetchedImage, FetchError>;

    async fn fetch_html(&self, url: &Url) -> Result<FetchedPage, FetchError>;
}

#[derive(Debug, Clone)]
pub struct FetcherSettings {
    pub timeout: Duration,
    pub image_max_bytes: usize,
    pub page_max_bytes: usize,
    /// Check resolved addresses and redirect hops against the blocked ranges
    pub guard_resolved_addrs: bool,
}

impl Default for FetcherSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            image_max_bytes: DEFAULT_IMAGE_MAX_BYTES,
            page_max_bytes: DEFAULT_LINK_PREVIEW_MAX_BYTES,
            guard_resolved_addrs: true,
        }
    }
}

/// DNS resolver that drops addresses in blocked ranges.
///
/// Resolution fails when nothing public remains, so a hostname that points at
/// the private network can never be connected to.
struct GuardedResolver;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

impl Resolve for GuardedResolver {
    fn resolve(&self, name: Name) -> Resolving {
        Box::pin(resolve_public(name.as_str().to_string()))
    }
}

async fn resolve_public(host: String) -> Result<Addrs, BoxError> {
    let resolved = tokio::net::lookup_host((host.as_str(), 0)).await?;

    let mut blocked = None;
    let allowed: Vec<SocketAddr> = resolved
        .filter(|addr| {
            if is_private_ip(&addr.ip()) {
                blocked = Some(addr.ip());
                false
            } else {
                true
            }
        })
        .collect();

    if allowed.is_empty() {
        return match blocked {
            Some(ip) => {
                tracing::warn!(host = %host, ip = %ip, "Hostname resolves only to blocked addresses");
                Err(Box::new(UrlRejection::BlockedIp(ip)))
            }
            None => Err(format!("no addresses found for {}", host).into()),
        };
    }

    Ok(Box::new(allowed.into_iter()))
}

/// `ImageFetcher` backed by a shared `reqwest::Client`
#[derive(Clone)]
pub struct HttpImageFetcher {
    client: reqwest::Client,
    settings: FetcherSettings,
}

impl HttpImageFetcher {
    pub fn new(settings: FetcherSettings) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder()
            .timeout(settings.timeout)
            .user_agent(BROWSER_USER_AGENT);

        if settings.guard_resolved_addrs {
            builder = builder
                .dns_resolver(Arc::new(GuardedResolver))
                .redirect(reqwest::redirect::Policy::custom(|attempt| {
                    if attempt.previous().len() > MAX_REDIRECTS {
                        return attempt.error("too many redirects");
                    }
                    match validate_image_url(attempt.url().as_str()) {
                        Ok(_) => attempt.follow(),
                        Err(rejection) => attempt.error(rejection),
                    }
                }));
        } else {
            builder = builder.redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS));
        }

        let client = builder
            .build()
            .map_err(|e| FetchError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, settings })
    }

    async fn send(&self, url: &Url, accept: &str) -> Result<reqwest::Response, FetchError> {
        let referer = format!("{}/", url.origin().ascii_serialization());

        let response = self
            .client
            .get(url.clone())
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .header(ACCEPT, accept)
            .header(ACCEPT_LANGUAGE, ACCEPT_LANGUAGE_VALUE)
            .header(REFERER, referer)
            .send()
            .await
            .map_err(map_request_error)?;

        if !response.status().is_success() {
            return Err(FetchError::UpstreamStatus(response.status().as_u16()));
        }

        Ok(response)
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    #[tracing::instrument(skip(self), fields(operation = "fetch_image", url = %url))]
    async fn fetch_image(&self, url: &Url) -> Result<FetchedImage, FetchError> {
        let start = std::time::Instant::now();
        let response = self.send(url, IMAGE_ACCEPT).await?;

        let content_type = media_type(&response).unwrap_or_default();
        if !content_type.starts_with("image/") {
            return Err(FetchError::NotAnImage(if content_type.is_empty() {
                "missing content type".to_string()
            } else {
                content_type
            }));
        }

        let bytes = read_capped(response, self.settings.image_max_bytes).await?;

        tracing::debug!(
            content_type = %content_type,
            size_bytes = bytes.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Fetched upstream image"
        );

        Ok(FetchedImage {
            bytes,
            content_type,
        })
    }

    #[tracing::instrument(skip(self), fields(operation = "fetch_html", url = %url))]
    async fn fetch_html(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let response = self.send(url, HTML_ACCEPT).await?;
        let final_url = response.url().clone();

        // Missing content type is tolerated
        if let Some(content_type) = media_type(&response) {
            if content_type != "text/html" && content_type != "application/xhtml+xml" {
                return Err(FetchError::NotHtml(content_type));
            }
        }

        let bytes = read_capped(response, self.settings.page_max_bytes).await?;
        let html = String::from_utf8_lossy(&bytes).into_owned();

        Ok(FetchedPage { final_url, html })
    }
}

/// Lowercased media type of the response, without parameters
fn media_type(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
}

/// Read the body chunk by chunk, stopping as soon as `limit` is exceeded.
async fn read_capped(mut response: reqwest::Response, limit: usize) -> Result<Bytes, FetchError> {
    let declared = response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    if let Some(len) = declared {
        if len > limit as u64 {
            return Err(FetchError::TooLarge { limit });
        }
    }

    let mut buf = BytesMut::with_capacity(declared.unwrap_or(0).min(limit as u64) as usize);
    while let Some(chunk) = response.chunk().await.map_err(map_request_error)? {
        if buf.len() + chunk.len() > limit {
            return Err(FetchError::TooLarge { limit });
        }
        buf.extend_from_slice(&chunk);
    }

    Ok(buf.freeze())
}

fn map_request_error(err: reqwest::Error) -> FetchError {
    if let Some(rejection) = find_rejection(&err) {
        return FetchError::Blocked(rejection);
    }
    if err.is_timeout() {
        return FetchError::Timeout;
    }
    FetchError::Request(error_chain(&err))
}

fn find_rejection(err: &(dyn std::error::Error + 'static)) -> Option<UrlRejection> {
    let mut source = Some(err);
    while let Some(current) = source {
        if let Some(rejection) = current.downcast_ref::<UrlRejection>() {
            return Some(rejection.clone());
        }
        source = current.source();
    }
    None
}

fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
