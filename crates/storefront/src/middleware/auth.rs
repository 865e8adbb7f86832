//! Authentication middleware and extractors.
//!
//! Provides extractors for requiring a logged-in user (or an admin) in
//! route handlers. Identity lives entirely at the provider: the access
//! token cookie is validated against GoTrue on each extraction, and the
//! admin role comes from the `profiles` table.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::auth::cookies::{ACCESS_TOKEN_COOKIE, plain_value, request_jar};
use crate::error::AppError;
use crate::state::AppState;
use crate::supabase::AuthUser;

/// Role value in `profiles` that unlocks the admin surface.
const ADMIN_ROLE: &str = "admin";

/// Extractor that optionally resolves the current user.
///
/// Yields `None` for missing, expired, or invalid tokens; never rejects.
pub struct OptionalUser(pub Option<AuthUser>);

/// Extractor that requires a logged-in user.
///
/// # Example
///
/// ```rust,ignore
/// async fn me(RequireUser(user): RequireUser) -> impl IntoResponse {
///     Json(user)
/// }
/// ```
pub struct RequireUser(pub AuthUser);

/// Extractor that requires a logged-in user with the admin role.
pub struct RequireAdmin(pub AuthUser);

async fn resolve_user(parts: &Parts, state: &AppState) -> Result<Option<AuthUser>, AppError> {
    let jar = request_jar(&parts.headers);
    let Some(token) = plain_value(&jar, ACCESS_TOKEN_COOKIE) else {
        return Ok(None);
    };
    Ok(state.auth().get_user(&token).await?)
}

impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(resolve_user(parts, state).await.unwrap_or(None)))
    }
}

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        resolve_user(parts, state)
            .await?
            .map(Self)
            .ok_or_else(|| AppError::Unauthorized("login required".to_string()))
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = resolve_user(parts, state)
            .await?
            .ok_or_else(|| AppError::Unauthorized("login required".to_string()))?;

        let role = state.data().profile_role(&user.id).await?;
        if role.as_deref() == Some(ADMIN_ROLE) {
            Ok(Self(user))
        } else {
            Err(AppError::Forbidden("admin role required".to_string()))
        }
    }
}
