use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

pub use crate::auth::repo_types::{NewUser, User};

const USER_COLUMNS: &str = "id, email, password_hash, is_verified, \
     verification_token, verification_token_expires_at, \
     reset_token, reset_token_expires_at, created_at";

/// Persistence of users and their single-use tokens.
///
/// The `consume_*` methods check the token and its expiry and clear it in
/// one step, so a token can succeed at most once.
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;

    /// Returns `None` when the email is already taken.
    async fn create(&self, new_user: NewUser) -> anyhow::Result<Option<User>>;

    async fn set_verification_token(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: OffsetDateTime,
    ) -> anyhow::Result<()>;

    /// Marks the owner of an unexpired verification token as verified.
    async fn consume_verification_token(
        &self,
        token: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<User>>;

    async fn set_reset_token(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: OffsetDateTime,
    ) -> anyhow::Result<()>;

    /// Replaces the password hash of the owner of an unexpired reset token.
    async fn consume_reset_token(
        &self,
        token: &str,
        now: OffsetDateTime,
        password_hash: &str,
    ) -> anyhow::Result<Option<User>>;
}

#[derive(Clone)]
pub struct PgUserRepo {
    db: PgPool,
}

impl PgUserRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    async fn create(&self, new_user: NewUser) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, password_hash, verification_token, verification_token_expires_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email) DO NOTHING
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.verification_token)
        .bind(new_user.verification_token_expires_at)
        .fetch_optional(&self.db)
        .await
        .context("insert user")?;
        Ok(user)
    }

    async fn set_verification_token(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: OffsetDateTime,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
               SET verification_token = $2, verification_token_expires_at = $3
             WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(token)
        .bind(expires_at)
        .execute(&self.db)
        .await
        .context("set verification token")?;
        Ok(())
    }

    async fn consume_verification_token(
        &self,
        token: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
               SET is_verified = TRUE,
                   verification_token = NULL,
                   verification_token_expires_at = NULL
             WHERE verification_token = $1
               AND verification_token_expires_at > $2
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(token)
        .bind(now)
        .fetch_optional(&self.db)
        .await
        .context("consume verification token")?;
        Ok(user)
    }

    async fn set_reset_token(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: OffsetDateTime,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
               SET reset_token = $2, reset_token_expires_at = $3
             WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(token)
        .bind(expires_at)
        .execute(&self.db)
        .await
        .context("set reset token")?;
        Ok(())
    }

    async fn consume_reset_token(
        &self,
        token: &str,
        now: OffsetDateTime,
        password_hash: &str,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
               SET password_hash = $3,
                   reset_token = NULL,
                   reset_token_expires_at = NULL
             WHERE reset_token = $1
               AND reset_token_expires_at > $2
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(token)
        .bind(now)
        .bind(password_hash)
        .fetch_optional(&self.db)
        .await
        .context("consume reset token")?;
        Ok(user)
    }
}
