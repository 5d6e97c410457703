use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    #[serde(alias = "content")]
    pub body: String,
    #[serde(default, alias = "image")]
    pub image_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePostRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, alias = "content")]
    pub body: Option<String>,
    /// An empty string removes the image.
    #[serde(default, alias = "image")]
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}
