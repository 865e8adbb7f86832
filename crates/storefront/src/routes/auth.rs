//! Authentication API route handlers.
//!
//! Email/password login, registration, and logout against the provider's
//! auth service. Session tokens are provider-issued and live in HttpOnly
//! cookies; handlers describe cookie changes as ops and apply them once
//! at the response boundary.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use crate::auth::CookieOp;
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::OptionalUser;
use crate::routes::with_cookie_ops;
use crate::state::AppState;
use crate::supabase::{AuthUser, SignupOutcome, SupabaseError, TokenResponse};

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Signup request body.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
}

fn user_body(user: Option<&AuthUser>) -> serde_json::Value {
    serde_json::json!({ "user": user })
}

/// Map provider auth rejections to a credentials error without leaking
/// which half of the pair was wrong.
fn credentials_error(err: SupabaseError) -> AppError {
    match err.status() {
        Some(400..=499) => AppError::Unauthorized("Invalid credentials".to_string()),
        _ => AppError::Supabase(err),
    }
}

fn session_ops(token: &TokenResponse) -> Vec<CookieOp> {
    vec![CookieOp::SetSession {
        access_token: token.access_token.clone(),
        refresh_token: token.refresh_token.clone(),
    }]
}

/// Log in with email and password.
///
/// # Route
///
/// `POST /api/auth/login`
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Response> {
    let token = state
        .auth()
        .sign_in(&request.email, &request.password)
        .await
        .map_err(credentials_error)?;

    if let Some(user) = &token.user {
        set_sentry_user(&user.id, user.email.as_deref());
        tracing::info!(user_id = %user.id, "login succeeded");
    }

    let body = Json(user_body(token.user.as_ref()));
    Ok(with_cookie_ops(body, &session_ops(&token), &state))
}

/// Register a new account.
///
/// When the provider has email confirmation disabled, signup returns a
/// full session and the user is logged in immediately. Otherwise only the
/// pending user record comes back and no session cookies are set.
///
/// # Route
///
/// `POST /api/auth/signup`
#[instrument(skip_all)]
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Result<Response> {
    if request.password.len() < 8 {
        return Err(AppError::BadRequest(
            "password must be at least 8 characters".to_string(),
        ));
    }

    let outcome = state
        .auth()
        .sign_up(&request.full_name, &request.email, &request.password)
        .await?;

    match outcome {
        SignupOutcome::Session(token) => {
            if let Some(user) = &token.user {
                set_sentry_user(&user.id, user.email.as_deref());
            }
            let body = (
                StatusCode::CREATED,
                Json(serde_json::json!({
                    "user": token.user,
                    "confirmed": true,
                })),
            );
            Ok(with_cookie_ops(body, &session_ops(&token), &state))
        }
        SignupOutcome::User(user) => Ok((
            StatusCode::CREATED,
            Json(serde_json::json!({
                "user": user,
                "confirmed": false,
            })),
        )
            .into_response()),
    }
}

/// Log out.
///
/// Revokes the provider session when an access token is present, then
/// clears the session cookies either way.
///
/// # Route
///
/// `POST /api/auth/logout`
#[instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, headers: axum::http::HeaderMap) -> Response {
    use crate::auth::cookies::{ACCESS_TOKEN_COOKIE, plain_value, request_jar};

    if let Some(token) = plain_value(&request_jar(&headers), ACCESS_TOKEN_COOKIE)
        && let Err(err) = state.auth().sign_out(&token).await
    {
        // Local logout proceeds regardless.
        tracing::warn!(error = %err, "provider logout failed");
    }

    clear_sentry_user();

    with_cookie_ops(
        Json(serde_json::json!({ "ok": true })),
        &[CookieOp::ClearSession],
        &state,
    )
}

/// Current user, if any.
///
/// # Route
///
/// `GET /api/auth/me`
pub async fn me(OptionalUser(user): OptionalUser) -> Json<serde_json::Value> {
    Json(user_body(user.as_ref()))
}
