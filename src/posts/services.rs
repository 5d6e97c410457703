use crate::error::ApiError;

use super::dto::{CreatePostRequest, ListQuery, UpdatePostRequest};
use super::repo_types::{NewPost, PostChanges, PostFilter};

pub const MAX_TITLE_CHARS: usize = 200;
pub const MAX_BODY_CHARS: usize = 50_000;
pub const MAX_PAGE_SIZE: i64 = 100;

fn title(raw: &str) -> Result<String, ApiError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(ApiError::validation("Title is required"));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(ApiError::validation(format!(
            "Title must be at most {MAX_TITLE_CHARS} characters"
        )));
    }
    Ok(title.to_string())
}

fn body(raw: &str) -> Result<String, ApiError> {
    let body = raw.trim();
    if body.is_empty() {
        return Err(ApiError::validation("Body is required"));
    }
    if body.chars().count() > MAX_BODY_CHARS {
        return Err(ApiError::validation(format!(
            "Body must be at most {MAX_BODY_CHARS} characters"
        )));
    }
    Ok(body.to_string())
}

fn image_url(raw: &str) -> Result<Option<String>, ApiError> {
    let url = raw.trim();
    if url.is_empty() {
        return Ok(None);
    }
    if !(url.starts_with("http://") || url.starts_with("https://") || url.starts_with("data:image/")) {
        return Err(ApiError::validation("Image must be an http(s) or data:image URL"));
    }
    Ok(Some(url.to_string()))
}

pub fn validate_new(req: CreatePostRequest) -> Result<NewPost, ApiError> {
    Ok(NewPost {
        title: title(&req.title)?,
        body: body(&req.body)?,
        image_url: match req.image_url.as_deref() {
            Some(raw) => image_url(raw)?,
            None => None,
        },
    })
}

pub fn validate_changes(req: UpdatePostRequest) -> Result<PostChanges, ApiError> {
    let changes = PostChanges {
        title: req.title.as_deref().map(title).transpose()?,
        body: req.body.as_deref().map(body).transpose()?,
        image_url: req.image_url.as_deref().map(image_url).transpose()?,
    };
    if changes.title.is_none() && changes.body.is_none() && changes.image_url.is_none() {
        return Err(ApiError::validation("Nothing to update"));
    }
    Ok(changes)
}

pub fn filter(query: ListQuery) -> PostFilter {
    PostFilter {
        title_contains: query
            .q
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty()),
        limit: query.limit.clamp(1, MAX_PAGE_SIZE),
        offset: query.offset.max(0),
    }
}
