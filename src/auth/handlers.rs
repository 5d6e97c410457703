use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AuthResponse, EmailRequest, LoginRequest, MeResponse, MessageResponse, PublicUser,
            RefreshRequest, ResetPasswordRequest, SignupRequest, VerifiedResponse,
            VerifyEmailRequest,
        },
        extractors::AuthUser,
        jwt::JwtKeys,
        password::{check_policy, hash_password, verify_password},
        repo::{NewUser, User},
        services::{
            deliver_verification, generate_token, parse_email, send_password_reset,
            send_verification, VERIFICATION_TTL,
        },
    },
    error::{ApiError, ApiResult, JsonBody, PathParam, QueryParams},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/verify-email", get(verify_email_link).post(verify_email))
        .route("/auth/resend-verification", post(resend_verification))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password/:token", post(reset_password))
        .route("/auth/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<SignupRequest>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    let email = parse_email(&payload.email).map_err(|e| {
        warn!(email = %payload.email, "invalid email");
        e
    })?;
    check_policy(&payload.password).map_err(ApiError::Validation)?;

    if state.users.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(ApiError::Conflict("Email already registered".into()));
    }

    let password_hash = hash_password(&payload.password)?;
    let token = generate_token();
    let new_user = NewUser {
        email,
        password_hash,
        verification_token: token.clone(),
        verification_token_expires_at: OffsetDateTime::now_utc() + VERIFICATION_TTL,
    };

    // The unique index decides concurrent signups for the same address.
    let Some(user) = state.users.create(new_user).await? else {
        return Err(ApiError::Conflict("Email already registered".into()));
    };
    info!(user_id = %user.id, email = %user.email, "user signed up");

    let message = match deliver_verification(&state, &user.email, &token, false).await {
        Ok(()) => "Account created. Check your email to verify your address.",
        Err(e) => {
            error!(error = ?e, user_id = %user.id, "verification email failed");
            "Account created, but the verification email could not be sent. Request a new one."
        }
    };

    Ok((StatusCode::CREATED, Json(MessageResponse::ok(message))))
}

/// Target of the emailed link; answers with a redirect to the frontend.
#[instrument(skip(state, query))]
pub async fn verify_email_link(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<VerifyEmailRequest>,
) -> ApiResult<Redirect> {
    let login = format!("{}/login", state.config.frontend_url);

    let Some(token) = query.token.filter(|t| !t.trim().is_empty()) else {
        return Ok(Redirect::to(&format!("{login}?verified=false&error=missing_token")));
    };

    match state
        .users
        .consume_verification_token(token.trim(), OffsetDateTime::now_utc())
        .await?
    {
        Some(user) => {
            info!(user_id = %user.id, "email verified");
            Ok(Redirect::to(&format!("{login}?verified=true")))
        }
        None => {
            warn!("invalid or expired verification token");
            Ok(Redirect::to(&format!("{login}?verified=false&error=invalid_token")))
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn verify_email(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<VerifyEmailRequest>,
) -> ApiResult<Json<VerifiedResponse>> {
    let token = payload
        .token
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::validation("Verification token is required"))?;

    let user = state
        .users
        .consume_verification_token(token, OffsetDateTime::now_utc())
        .await?
        .ok_or_else(|| {
            warn!("invalid or expired verification token");
            ApiError::validation("Invalid or expired verification token")
        })?;

    info!(user_id = %user.id, "email verified");
    Ok(Json(VerifiedResponse {
        success: true,
        message: "Email verified successfully".into(),
        email: user.email,
    }))
}

#[instrument(skip(state, payload))]
pub async fn resend_verification(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<EmailRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let email = parse_email(&payload.email)?;
    let user = find_user(&state, &email).await?;

    if user.is_verified {
        return Err(ApiError::validation("Email is already verified"));
    }

    send_verification(&state, &user).await?;
    Ok(Json(MessageResponse::ok("New verification email sent")))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let email = parse_email(&payload.email)?;

    let Some(user) = state.users.find_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(ApiError::unauthorized("Invalid credentials"));
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    if !user.is_verified {
        warn!(user_id = %user.id, "login before email verification");
        return Err(ApiError::Forbidden(
            "Please verify your email before logging in".into(),
        ));
    }

    info!(user_id = %user.id, email = %user.email, "user logged in");
    issue_tokens(&state, user).map(Json)
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RefreshRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys.verify_refresh(&payload.refresh_token).map_err(|e| {
        warn!(error = %e, "refresh rejected");
        ApiError::unauthorized("Invalid or expired refresh token")
    })?;

    let user = state
        .users
        .find_by_id(claims.sub)
        .await?
        .ok_or_else(|| ApiError::unauthorized("User not found"))?;

    issue_tokens(&state, user).map(Json)
}

#[instrument(skip(state))]
pub async fn get_me(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<MeResponse>> {
    let user = state
        .users
        .find_by_id(auth.id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("User not found"))?;

    Ok(Json(MeResponse {
        id: user.id,
        email: user.email,
        is_verified: user.is_verified,
        created_at: user.created_at,
    }))
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<EmailRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let email = parse_email(&payload.email)?;
    let user = find_user(&state, &email).await?;

    send_password_reset(&state, &user).await?;
    Ok(Json(MessageResponse::ok(
        "Password reset link sent to your email",
    )))
}

#[instrument(skip(state, token, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    PathParam(token): PathParam<String>,
    JsonBody(payload): JsonBody<ResetPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    check_policy(&payload.new_password).map_err(ApiError::Validation)?;

    let password_hash = hash_password(&payload.new_password)?;
    let user = state
        .users
        .consume_reset_token(token.trim(), OffsetDateTime::now_utc(), &password_hash)
        .await?
        .ok_or_else(|| {
            warn!("invalid or expired reset token");
            ApiError::validation("Invalid or expired token")
        })?;

    info!(user_id = %user.id, "password reset");
    Ok(Json(MessageResponse::ok("Password reset successful")))
}

async fn find_user(state: &AppState, email: &str) -> ApiResult<User> {
    state
        .users
        .find_by_email(email)
        .await?
        .ok_or_else(|| ApiError::not_found("Email not found"))
}

fn issue_tokens(state: &AppState, user: User) -> ApiResult<AuthResponse> {
    let keys = JwtKeys::from_ref(state);
    let access_token = keys.sign_access(user.id)?;
    let refresh_token = keys.sign_refresh(user.id)?;
    Ok(AuthResponse {
        success: true,
        token_type: "Bearer",
        access_token,
        refresh_token,
        expires_in: keys.access_ttl.as_secs(),
        user: PublicUser {
            id: user.id,
            email: user.email,
        },
    })
}
