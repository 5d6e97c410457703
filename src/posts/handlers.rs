use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    error::{ApiError, ApiResult, JsonBody, PathParam, QueryParams},
    state::AppState,
};

use super::dto::{CreatePostRequest, ListQuery, UpdatePostRequest};
use super::repo::Post;
use super::services::{filter, validate_changes, validate_new};

pub fn post_routes() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route(
            "/posts/:id",
            get(get_post).put(update_post).delete(delete_post),
        )
}

#[instrument(skip(state, payload), fields(user_id = %auth.id))]
pub async fn create_post(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(payload): JsonBody<CreatePostRequest>,
) -> ApiResult<(StatusCode, HeaderMap, Json<Post>)> {
    let new_post = validate_new(payload)?;
    let post = state.posts.create(auth.id, new_post).await?;
    info!(post_id = %post.id, "post created");

    let mut headers = HeaderMap::new();
    if let Ok(location) = HeaderValue::from_str(&format!("/api/posts/{}", post.id)) {
        headers.insert(header::LOCATION, location);
    }
    Ok((StatusCode::CREATED, headers, Json(post)))
}

#[instrument(skip(state), fields(user_id = %auth.id))]
pub async fn list_posts(
    State(state): State<AppState>,
    auth: AuthUser,
    QueryParams(query): QueryParams<ListQuery>,
) -> ApiResult<Json<Vec<Post>>> {
    let posts = state.posts.list_by_user(auth.id, &filter(query)).await?;
    Ok(Json(posts))
}

#[instrument(skip(state), fields(user_id = %auth.id))]
pub async fn get_post(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<Json<Post>> {
    state
        .posts
        .find(auth.id, id)
        .await?
        .map(Json)
        .ok_or_else(post_not_found)
}

#[instrument(skip(state, payload), fields(user_id = %auth.id))]
pub async fn update_post(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParam(id): PathParam<Uuid>,
    JsonBody(payload): JsonBody<UpdatePostRequest>,
) -> ApiResult<Json<Post>> {
    let changes = validate_changes(payload)?;
    let post = state
        .posts
        .update(auth.id, id, changes)
        .await?
        .ok_or_else(post_not_found)?;
    info!(post_id = %post.id, "post updated");
    Ok(Json(post))
}

#[instrument(skip(state), fields(user_id = %auth.id))]
pub async fn delete_post(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<StatusCode> {
    if !state.posts.delete(auth.id, id).await? {
        warn!(post_id = %id, "delete of missing post");
        return Err(post_not_found());
    }
    info!(post_id = %id, "post deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn post_not_found() -> ApiError {
    ApiError::not_found("Post not found")
}
