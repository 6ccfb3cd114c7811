use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Metadata extracted from a web page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LinkPreview {
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Absolute URL of the preview image
    pub image: Option<String>,
    pub site_name: Option<String>,
}

/// Link preview response: either extracted metadata or `{url, error}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum LinkPreviewResponse {
    Preview(LinkPreview),
    Failed { url: String, error: String },
}
