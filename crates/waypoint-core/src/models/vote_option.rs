use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Image columns of a vote option row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct VoteOptionImages {
    pub id: Uuid,
    pub image_url: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(default))]
    pub photo_urls: Option<Vec<String>>,
}

impl VoteOptionImages {
    pub fn photo_urls(&self) -> &[String] {
        self.photo_urls.as_deref().unwrap_or(&[])
    }
}

/// Partial update of a vote option's image columns. `None` leaves a column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoteOptionImageUpdate {
    pub image_url: Option<String>,
    pub photo_urls: Option<Vec<String>>,
}

impl VoteOptionImageUpdate {
    pub fn is_empty(&self) -> bool {
        self.image_url.is_none() && self.photo_urls.is_none()
    }
}
