//! Anonymous shopper session middleware.
//!
//! Carts and wishlists belong to a browser, not an account. Each browser
//! gets a random shopper id in the `clm_sid` cookie; the id keys the
//! snapshot files the stores persist to. Two tabs share one id, so they
//! share one cart, with last write winning.

use axum::{
    extract::{Request, State},
    http::{HeaderValue, header::SET_COOKIE},
    middleware::Next,
    response::Response,
};
use cookie::time::Duration;
use cookie::{Cookie, SameSite};
use uuid::Uuid;

use crate::auth::cookies::{STORE_SESSION_COOKIE, plain_value, request_jar};
use crate::state::AppState;

/// Shopper sessions outlive login sessions; half a year of cart memory.
const SESSION_MAX_AGE_DAYS: i64 = 180;

/// Per-request shopper identity, inserted into request extensions.
#[derive(Debug, Clone)]
pub struct ShopperSession {
    id: String,
}

impl ShopperSession {
    /// Snapshot key for this shopper's cart.
    #[must_use]
    pub fn cart_key(&self) -> String {
        format!("cart_{}", self.id)
    }

    /// Snapshot key for this shopper's wishlist.
    #[must_use]
    pub fn wishlist_key(&self) -> String {
        format!("wishlist_{}", self.id)
    }
}

/// Ensure every request carries a shopper id.
///
/// Reuses the `clm_sid` cookie when present and well-formed, otherwise
/// mints a fresh id and sets the cookie on the response.
pub async fn store_session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let existing = plain_value(&request_jar(request.headers()), STORE_SESSION_COOKIE)
        .filter(|id| is_valid_session_id(id));

    let is_new = existing.is_none();
    let id = existing.unwrap_or_else(|| Uuid::new_v4().to_string());

    request
        .extensions_mut()
        .insert(ShopperSession { id: id.clone() });

    let mut response = next.run(request).await;

    if is_new {
        let cookie = Cookie::build((STORE_SESSION_COOKIE, id))
            .http_only(true)
            .secure(state.config().is_secure())
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(Duration::days(SESSION_MAX_AGE_DAYS))
            .build();
        if let Ok(value) = HeaderValue::from_str(&cookie.encoded().to_string()) {
            response.headers_mut().append(SET_COOKIE, value);
        }
    }

    response
}

/// Session ids end up in snapshot file names; accept only ids we minted.
fn is_valid_session_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 64
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_session_ids_are_valid() {
        assert!(is_valid_session_id(&Uuid::new_v4().to_string()));
    }

    #[test]
    fn malformed_session_ids_are_rejected() {
        assert!(!is_valid_session_id(""));
        assert!(!is_valid_session_id("../../etc/passwd"));
        assert!(!is_valid_session_id("id with spaces"));
        assert!(!is_valid_session_id(&"a".repeat(65)));
    }

    #[test]
    fn snapshot_keys_are_namespaced_per_store() {
        let session = ShopperSession {
            id: "abc-123".to_string(),
        };
        assert_eq!(session.cart_key(), "cart_abc-123");
        assert_eq!(session.wishlist_key(), "wishlist_abc-123");
    }
}
