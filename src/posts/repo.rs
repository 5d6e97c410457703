use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

pub use super::repo_types::{NewPost, Post, PostChanges, PostFilter};

/// Post persistence. Every method is scoped to the owning user; a post of
/// another user behaves as if it did not exist.
#[async_trait]
pub trait PostRepo: Send + Sync {
    async fn create(&self, user_id: Uuid, post: NewPost) -> anyhow::Result<Post>;

    /// Newest first.
    async fn list_by_user(&self, user_id: Uuid, filter: &PostFilter) -> anyhow::Result<Vec<Post>>;

    async fn find(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<Post>>;

    async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        changes: PostChanges,
    ) -> anyhow::Result<Option<Post>>;

    /// Returns whether a post was deleted.
    async fn delete(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<bool>;
}

#[derive(Clone)]
pub struct PgPostRepo {
    db: PgPool,
}

impl PgPostRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PostRepo for PgPostRepo {
    async fn create(&self, user_id: Uuid, post: NewPost) -> anyhow::Result<Post> {
        let row = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (user_id, title, body, image_url)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, title, body, image_url, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(&post.title)
        .bind(&post.body)
        .bind(&post.image_url)
        .fetch_one(&self.db)
        .await
        .context("insert post")?;
        Ok(row)
    }

    async fn list_by_user(&self, user_id: Uuid, filter: &PostFilter) -> anyhow::Result<Vec<Post>> {
        let rows = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, user_id, title, body, image_url, created_at, updated_at
              FROM posts
             WHERE user_id = $1
               AND ($2::text IS NULL OR strpos(lower(title), lower($2)) > 0)
             ORDER BY created_at DESC, id
             LIMIT $3 OFFSET $4
            "#,
        )
        .bind(user_id)
        .bind(&filter.title_contains)
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(&self.db)
        .await
        .context("list posts by user")?;
        Ok(rows)
    }

    async fn find(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<Post>> {
        let row = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, user_id, title, body, image_url, created_at, updated_at
              FROM posts
             WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .context("find post")?;
        Ok(row)
    }

    async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        changes: PostChanges,
    ) -> anyhow::Result<Option<Post>> {
        let (set_image, image_url) = match changes.image_url {
            Some(url) => (true, url),
            None => (false, None),
        };
        let row = sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts
               SET title      = COALESCE($3, title),
                   body       = COALESCE($4, body),
                   image_url  = CASE WHEN $5 THEN $6 ELSE image_url END,
                   updated_at = now()
             WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, title, body, image_url, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&changes.title)
        .bind(&changes.body)
        .bind(set_image)
        .bind(image_url)
        .fetch_optional(&self.db)
        .await
        .context("update post")?;
        Ok(row)
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.db)
            .await
            .context("delete post")?;
        Ok(result.rows_affected() > 0)
    }
}
