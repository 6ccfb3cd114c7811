use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Query parameters shared by the single-URL endpoints
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExternalUrlQuery {
    /// Absolute http(s) URL of the external resource
    pub url: Option<String>,
}

/// Result of a cache-image request. Exactly one field is present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CacheImageResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CacheImageResponse {
    pub fn hosted(public_url: impl Into<String>) -> Self {
        Self {
            public_url: Some(public_url.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            public_url: None,
            error: Some(error.into()),
        }
    }
}
