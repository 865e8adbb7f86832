//! OAuth PKCE route handlers.
//!
//! Two endpoints per login attempt: `begin` mints a verifier/challenge
//! pair, stores the verifier in a signed cookie, and redirects to the
//! provider; `callback` validates what came back, performs the code
//! exchange, and sets the session cookies. Every failure path ends in a
//! redirect with a generic error code; provider error payloads are logged
//! server-side only.

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{Redirect, Response},
};
use tracing::instrument;

use crate::auth::cookies::{request_jar, verifier_from};
use crate::auth::handshake::{self, AuthFailure, CallbackParams, LoginTicket, Provider};
use crate::error::set_sentry_user;
use crate::routes::with_cookie_ops;
use crate::state::AppState;

/// Start a PKCE login with the named provider.
///
/// # Route
///
/// `GET /auth/oauth/{provider}`
#[instrument(skip(state, headers))]
pub async fn begin(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    headers: HeaderMap,
) -> Response {
    let Ok(provider) = provider.parse::<Provider>() else {
        tracing::warn!(provider, "login attempted with unknown provider");
        return with_cookie_ops(Redirect::to("/login?error=unknown_provider"), &[], &state);
    };

    let ticket = LoginTicket::begin(provider);

    // The callback must come back to the deployment that served this
    // request, so the origin is taken from the request itself. Preview and
    // staging hosts would otherwise all bounce through one configured URL.
    let origin = request_origin(&headers, &state.config().base_url);
    let redirect_to = format!("{origin}/auth/callback");
    let authorize = state
        .auth()
        .authorize_url(ticket.provider, &redirect_to, &ticket.challenge);

    let ttl = i64::try_from(state.config().verifier_ttl_secs).unwrap_or(600);
    let ops = [ticket.cookie_op(ttl)];

    with_cookie_ops(Redirect::to(&authorize), &ops, &state)
}

/// Handle the provider callback.
///
/// The verifier comes from its signed cookie; a missing or forged cookie
/// fails the flow before any provider I/O. Success sets the session token
/// cookies and clears the verifier; failure clears the verifier alone.
///
/// # Route
///
/// `GET /auth/callback`
#[instrument(skip_all)]
pub async fn callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
    headers: HeaderMap,
) -> Response {
    if let Some(error) = &params.error {
        tracing::warn!(
            error,
            description = params.error_description.as_deref().unwrap_or(""),
            "provider reported an authorization error"
        );
    }

    let jar = request_jar(&headers);
    let verifier = verifier_from(&jar, state.cookie_key());

    let exchange = match handshake::plan_callback(&params, verifier) {
        Ok(exchange) => exchange,
        Err(failure) => return failed(failure, &state),
    };

    match state
        .auth()
        .exchange_code(&exchange.code, &exchange.verifier)
        .await
    {
        Ok(token) => {
            if let Some(user) = &token.user {
                set_sentry_user(&user.id, user.email.as_deref());
                tracing::info!(user_id = %user.id, "oauth login succeeded");
            }
            let ops = handshake::success_cookie_ops(token.access_token, token.refresh_token);
            with_cookie_ops(Redirect::to("/"), &ops, &state)
        }
        Err(err) => {
            tracing::error!(error = %err, "pkce code exchange failed");
            failed(AuthFailure::ExchangeFailed, &state)
        }
    }
}

fn failed(failure: AuthFailure, state: &AppState) -> Response {
    tracing::warn!(reason = %failure, "oauth flow failed");
    with_cookie_ops(
        Redirect::to(&failure.redirect_target()),
        &handshake::failure_cookie_ops(),
        state,
    )
}

/// Origin of the incoming request, proxy headers included.
///
/// Host comes from `X-Forwarded-Host` when a proxy sits in front, else the
/// `Host` header; the scheme from `X-Forwarded-Proto`, else whatever the
/// fallback URL uses. Requests carrying neither host header (no client
/// sends those) fall back to the configured public URL.
fn request_origin(headers: &HeaderMap, fallback: &str) -> String {
    let fallback = fallback.trim_end_matches('/');
    let host = headers
        .get("x-forwarded-host")
        .or_else(|| headers.get(axum::http::header::HOST))
        .and_then(|v| v.to_str().ok());
    let Some(host) = host else {
        return fallback.to_string();
    };

    let fallback_proto = if fallback.starts_with("https://") {
        "https"
    } else {
        "http"
    };
    let proto = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or(fallback_proto);

    format!("{proto}://{host}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const FALLBACK: &str = "http://localhost:3000";

    #[test]
    fn origin_follows_the_request_host() {
        let mut headers = HeaderMap::new();
        headers.insert("host", HeaderValue::from_static("preview.example.com"));
        headers.insert("x-forwarded-proto", HeaderValue::from_static("https"));
        assert_eq!(
            request_origin(&headers, FALLBACK),
            "https://preview.example.com"
        );
    }

    #[test]
    fn forwarded_host_wins_over_host() {
        let mut headers = HeaderMap::new();
        headers.insert("host", HeaderValue::from_static("internal:8080"));
        headers.insert("x-forwarded-host", HeaderValue::from_static("shop.example"));
        headers.insert("x-forwarded-proto", HeaderValue::from_static("https"));
        assert_eq!(request_origin(&headers, FALLBACK), "https://shop.example");
    }

    #[test]
    fn hostless_request_uses_the_configured_url() {
        assert_eq!(
            request_origin(&HeaderMap::new(), "https://shop.example/"),
            "https://shop.example"
        );
    }

    #[test]
    fn scheme_defaults_to_the_fallback_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert("host", HeaderValue::from_static("localhost:3000"));
        assert_eq!(request_origin(&headers, FALLBACK), "http://localhost:3000");
        assert_eq!(
            request_origin(&headers, "https://shop.example"),
            "https://localhost:3000"
        );
    }
}
