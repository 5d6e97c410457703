use anyhow::Context;
use lazy_static::lazy_static;
use rand::RngCore;
use regex::Regex;
use time::{Duration, OffsetDateTime};
use tracing::info;

use crate::auth::repo::User;
use crate::error::ApiError;
use crate::mail::templates;
use crate::state::AppState;

pub const VERIFICATION_TTL: Duration = Duration::hours(24);
pub const RESET_TTL: Duration = Duration::hours(1);

const TOKEN_BYTES: usize = 32;

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Emails are stored and looked up trimmed and lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Normalizes and validates an email from a request body.
pub fn parse_email(raw: &str) -> Result<String, ApiError> {
    let email = normalize_email(raw);
    if !is_valid_email(&email) {
        return Err(ApiError::validation("Invalid email"));
    }
    Ok(email)
}

/// 32 random bytes, hex encoded.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Issues a replacement verification token for `user` and emails the link.
pub async fn send_verification(state: &AppState, user: &User) -> anyhow::Result<()> {
    let token = generate_token();
    let expires_at = OffsetDateTime::now_utc() + VERIFICATION_TTL;
    state
        .users
        .set_verification_token(user.id, &token, expires_at)
        .await?;
    deliver_verification(state, &user.email, &token, true).await
}

/// `resend` only changes the email heading.
pub async fn deliver_verification(
    state: &AppState,
    email: &str,
    token: &str,
    resend: bool,
) -> anyhow::Result<()> {
    let link = templates::verification_link(&state.config.backend_url, token);
    state
        .mailer
        .send(templates::verification_email(email, &link, resend))
        .await
        .context("send verification email")?;
    info!(email = %email, resend, "verification email sent");
    Ok(())
}

/// Issues a reset token for `user` and emails the reset link.
pub async fn send_password_reset(state: &AppState, user: &User) -> anyhow::Result<()> {
    let token = generate_token();
    let expires_at = OffsetDateTime::now_utc() + RESET_TTL;
    state.users.set_reset_token(user.id, &token, expires_at).await?;

    let link = templates::reset_link(&state.config.frontend_url, &token);
    state
        .mailer
        .send(templates::reset_email(&user.email, &link))
        .await
        .context("send password reset email")?;
    info!(user_id = %user.id, "password reset email sent");
    Ok(())
}
