use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Post {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub body: String,
    pub image_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Validated fields of a new post.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub body: String,
    pub image_url: Option<String>,
}

/// Validated partial update; `None` leaves a column untouched and
/// `image_url: Some(None)` clears the image.
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub body: Option<String>,
    pub image_url: Option<Option<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    /// Case-insensitive title substring.
    pub title_contains: Option<String>,
    pub limit: i64,
    pub offset: i64,
}
