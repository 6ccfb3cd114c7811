//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`. Component errors
//! (`StorageError`, `UrlRejection`, `FetchError`, `RehostError`) convert into
//! `HttpAppError` so every failure renders the same JSON body.

use crate::services::{FetchError, RehostError};
use crate::utils::UrlRejection;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use waypoint_core::constants::NO_STORE;
use waypoint_core::{AppError, ErrorMetadata, LogLevel};
use waypoint_storage::StorageError;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    /// Whether this error is recoverable (can be retried)
    pub recoverable: bool,
    /// Suggested action for the client (e.g., "Retry after a short delay")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

/// Wrapper type for AppError to implement IntoResponse
/// This is necessary because of Rust's orphan rules - we can't implement
/// IntoResponse (external trait) for AppError (external type from waypoint-core)
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        })
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_type = error_type, "Error occurred");
        }
    }
}

fn is_production_env() -> bool {
    std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .map(|env| env.to_lowercase() == "production" || env.to_lowercase() == "prod")
        .unwrap_or(false)
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;
        let is_production = is_production_env();

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        // Always hide details in production; elsewhere only for sensitive errors.
        let body = if is_production || app_error.is_sensitive() {
            ErrorResponse {
                error: app_error.client_message(),
                details: None,
                error_type: None,
                code: app_error.error_code().to_string(),
                recoverable: app_error.is_recoverable(),
                suggested_action: app_error.suggested_action().map(String::from),
            }
        } else {
            ErrorResponse {
                error: app_error.client_message(),
                details: Some(app_error.detailed_message()),
                error_type: Some(app_error.error_type().to_string()),
                code: app_error.error_code().to_string(),
                recoverable: app_error.is_recoverable(),
                suggested_action: app_error.suggested_action().map(String::from),
            }
        };

        (status, [(header::CACHE_CONTROL, NO_STORE)], Json(body)).into_response()
    }
}

// Convert domain errors to HttpAppError (avoids orphan rule: we impl for local HttpAppError)

impl From<StorageError> for HttpAppError {
    fn from(err: StorageError) -> Self {
        let app = match err {
            StorageError::NotFound(msg) => AppError::NotFound(msg),
            StorageError::UploadFailed(msg)
            | StorageError::DownloadFailed(msg)
            | StorageError::BackendError(msg) => AppError::Storage(msg),
            StorageError::AlreadyExists(key) => {
                AppError::Storage(format!("object already exists: {}", key))
            }
            StorageError::InvalidKey(msg) => AppError::InvalidInput(msg),
            StorageError::IoError(err) => AppError::Internal(format!("IO error: {}", err)),
            StorageError::ConfigError(msg) => AppError::Configuration(msg),
        };
        HttpAppError(app)
    }
}

impl From<UrlRejection> for HttpAppError {
    fn from(err: UrlRejection) -> Self {
        let app = match err {
            UrlRejection::Malformed(msg) => AppError::InvalidInput(format!("Invalid URL: {}", msg)),
            blocked => AppError::BlockedTarget(blocked.to_string()),
        };
        HttpAppError(app)
    }
}

impl From<FetchError> for HttpAppError {
    fn from(err: FetchError) -> Self {
        let app = match err {
            FetchError::UpstreamStatus(status) => AppError::UpstreamNotFound(status.to_string()),
            FetchError::NotAnImage(content_type) => AppError::NotAnImage(content_type),
            FetchError::TooLarge { limit } => {
                AppError::PayloadTooLarge(format!("Image exceeds {} bytes", limit))
            }
            FetchError::Blocked(rejection) => return rejection.into(),
            other @ (FetchError::NotHtml(_) | FetchError::Timeout | FetchError::Request(_)) => {
                AppError::UpstreamFailure(other.to_string())
            }
        };
        HttpAppError(app)
    }
}

impl From<RehostError> for HttpAppError {
    fn from(err: RehostError) -> Self {
        match err {
            RehostError::Rejected(rejection) => rejection.into(),
            RehostError::Fetch(fetch) => fetch.into(),
            RehostError::Storage(storage) => storage.into(),
            RehostError::NoPublicUrl => HttpAppError(AppError::Configuration(
                "storage backend has no public URL".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    fn status_of(err: impl Into<HttpAppError>) -> u16 {
        let HttpAppError(app_err) = err.into();
        app_err.http_status_code()
    }

    #[test]
    fn test_from_storage_error_not_found() {
        let storage_err = StorageError::NotFound("cached/external/a.jpg".to_string());
        let HttpAppError(app_err) = storage_err.into();
        match app_err {
            AppError::NotFound(msg) => assert_eq!(msg, "cached/external/a.jpg"),
            _ => panic!("Expected NotFound variant"),
        }
    }

    #[test]
    fn test_from_storage_error_already_exists() {
        let HttpAppError(app_err) = StorageError::AlreadyExists("k".to_string()).into();
        assert!(matches!(app_err, AppError::Storage(_)));
    }

    #[test]
    fn test_url_rejection_statuses() {
        assert_eq!(status_of(UrlRejection::Malformed("relative URL".into())), 400);
        assert_eq!(status_of(UrlRejection::BlockedHost("localhost".into())), 400);
        assert_eq!(
            status_of(UrlRejection::BlockedIp(IpAddr::V4(Ipv4Addr::LOCALHOST))),
            400
        );
    }

    #[test]
    fn test_fetch_error_statuses() {
        assert_eq!(status_of(FetchError::UpstreamStatus(403)), 404);
        assert_eq!(status_of(FetchError::NotAnImage("text/html".into())), 415);
        assert_eq!(status_of(FetchError::TooLarge { limit: 10 }), 413);
        assert_eq!(status_of(FetchError::Timeout), 500);
        assert_eq!(status_of(FetchError::Request("reset".into())), 500);
        assert_eq!(
            status_of(FetchError::Blocked(UrlRejection::BlockedHost("localhost".into()))),
            400
        );
    }

    #[test]
    fn test_no_public_url_is_configuration_error() {
        let HttpAppError(app_err) = RehostError::NoPublicUrl.into();
        assert_eq!(app_err.error_code(), "CONFIGURATION_ERROR");
    }

    #[test]
    fn test_error_response_has_no_store() {
        let response = HttpAppError(AppError::InvalidInput("url is required".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).unwrap(),
            "no-store"
        );
    }
}
