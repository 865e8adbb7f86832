//! Cookie names, attribute policy, and the `CookieOp` boundary.
//!
//! Handlers never mutate cookies mid-function. The handshake state machine
//! returns [`CookieOp`] values describing what must change, and
//! [`render_ops`] turns them into `Set-Cookie` headers exactly once per
//! response. The PKCE verifier is signed with the application cookie key;
//! session tokens are opaque provider strings stored as-is.

use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use cookie::time::Duration;
use cookie::{Cookie, CookieJar, Key, SameSite};

/// Signed cookie carrying the PKCE code verifier between the initiate and
/// callback requests. Single-use, short TTL.
pub const VERIFIER_COOKIE: &str = "clm_pkce_verifier";

/// Provider access token.
pub const ACCESS_TOKEN_COOKIE: &str = "clm_access_token";

/// Provider refresh token.
pub const REFRESH_TOKEN_COOKIE: &str = "clm_refresh_token";

/// Snapshot key for the cart/wishlist stores (the localStorage analog).
pub const STORE_SESSION_COOKIE: &str = "clm_sid";

/// A cookie mutation described as data, applied once at the HTTP boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieOp {
    /// Store the code verifier for the duration of one login attempt.
    SetVerifier { value: String, max_age_secs: i64 },
    /// Delete the verifier (single-use, on success and failure alike).
    ClearVerifier,
    /// Store the provider session tokens.
    SetSession {
        access_token: String,
        refresh_token: String,
    },
    /// Delete the provider session tokens (logout).
    ClearSession,
}

/// Build a jar from the request's `Cookie` headers.
#[must_use]
pub fn request_jar(headers: &HeaderMap) -> CookieJar {
    let mut jar = CookieJar::new();
    for value in headers.get_all(COOKIE) {
        let Ok(raw) = value.to_str() else { continue };
        // Values are emitted percent-encoded, so they must be decoded here
        // or signed values containing base64 padding fail verification.
        for cookie in Cookie::split_parse_encoded(raw.to_owned()).flatten() {
            jar.add_original(cookie);
        }
    }
    jar
}

/// Read and authenticate the signed verifier cookie.
///
/// Returns `None` for a missing cookie and for one whose signature does not
/// verify; a forged verifier must look exactly like an absent one.
#[must_use]
pub fn verifier_from(jar: &CookieJar, key: &Key) -> Option<String> {
    jar.signed(key)
        .get(VERIFIER_COOKIE)
        .map(|c| c.value().to_string())
}

/// Read a plain cookie value by name.
#[must_use]
pub fn plain_value(jar: &CookieJar, name: &str) -> Option<String> {
    jar.get(name).map(|c| c.value().to_string())
}

/// Render cookie ops into `Set-Cookie` headers.
///
/// `secure` should reflect whether the storefront is served over HTTPS;
/// it gates the `Secure` attribute and the verifier's `SameSite=None`
/// (required for the cross-site provider redirect, but only valid together
/// with `Secure`).
#[must_use]
pub fn render_ops(ops: &[CookieOp], key: &Key, secure: bool) -> Vec<(HeaderName, HeaderValue)> {
    let mut jar = CookieJar::new();

    for op in ops {
        match op {
            CookieOp::SetVerifier {
                value,
                max_age_secs,
            } => {
                let cookie = base_cookie(VERIFIER_COOKIE, value.clone(), secure)
                    .same_site(if secure { SameSite::None } else { SameSite::Lax })
                    .max_age(Duration::seconds(*max_age_secs))
                    .build();
                jar.signed_mut(key).add(cookie);
            }
            CookieOp::ClearVerifier => {
                remove_cookie(&mut jar, VERIFIER_COOKIE);
            }
            CookieOp::SetSession {
                access_token,
                refresh_token,
            } => {
                jar.add(
                    base_cookie(ACCESS_TOKEN_COOKIE, access_token.clone(), secure)
                        .same_site(SameSite::Lax)
                        .build(),
                );
                jar.add(
                    base_cookie(REFRESH_TOKEN_COOKIE, refresh_token.clone(), secure)
                        .same_site(SameSite::Lax)
                        .build(),
                );
            }
            CookieOp::ClearSession => {
                remove_cookie(&mut jar, ACCESS_TOKEN_COOKIE);
                remove_cookie(&mut jar, REFRESH_TOKEN_COOKIE);
            }
        }
    }

    jar.delta()
        .filter_map(|cookie| {
            HeaderValue::from_str(&cookie.encoded().to_string())
                .ok()
                .map(|v| (SET_COOKIE, v))
        })
        .collect()
}

fn base_cookie(
    name: &'static str,
    value: String,
    secure: bool,
) -> cookie::CookieBuilder<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(secure)
        .path("/")
}

/// Queue a removal `Set-Cookie` for `name`.
///
/// The jar only emits a removal delta for cookies it believes the client
/// holds, so the name is registered as an original first; the delta is then
/// an expired cookie (`Max-Age=0`) with the matching path.
fn remove_cookie(jar: &mut CookieJar, name: &'static str) {
    let cookie = Cookie::build(name).path("/").build();
    jar.add_original(cookie.clone());
    jar.remove(cookie);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> Key {
        Key::derive_from(&[7u8; 64])
    }

    fn rendered(ops: &[CookieOp]) -> Vec<String> {
        render_ops(ops, &key(), true)
            .into_iter()
            .map(|(_, v)| v.to_str().expect("header value").to_string())
            .collect()
    }

    #[test]
    fn verifier_round_trips_through_signed_jar() {
        let k = key();
        let headers = rendered(&[CookieOp::SetVerifier {
            value: "the-verifier".to_string(),
            max_age_secs: 600,
        }]);
        assert_eq!(headers.len(), 1);

        // Feed the Set-Cookie value back as a request cookie.
        let pair = headers[0].split(';').next().expect("cookie pair");
        let mut request = HeaderMap::new();
        request.insert(COOKIE, HeaderValue::from_str(pair).expect("value"));

        let jar = request_jar(&request);
        assert_eq!(verifier_from(&jar, &k), Some("the-verifier".to_string()));
    }

    #[test]
    fn tampered_verifier_reads_as_absent() {
        let k = key();
        let mut request = HeaderMap::new();
        request.insert(
            COOKIE,
            HeaderValue::from_static("clm_pkce_verifier=forged-value"),
        );
        let jar = request_jar(&request);
        assert_eq!(verifier_from(&jar, &k), None);
    }

    #[test]
    fn verifier_cookie_carries_security_attributes() {
        let headers = rendered(&[CookieOp::SetVerifier {
            value: "v".to_string(),
            max_age_secs: 600,
        }]);
        let header = &headers[0];
        assert!(header.contains("HttpOnly"));
        assert!(header.contains("Secure"));
        assert!(header.contains("SameSite=None"));
        assert!(header.contains("Max-Age=600"));
        assert!(header.contains("Path=/"));
    }

    #[test]
    fn session_cookies_are_http_only_secure_lax() {
        let headers = rendered(&[CookieOp::SetSession {
            access_token: "at".to_string(),
            refresh_token: "rt".to_string(),
        }]);
        assert_eq!(headers.len(), 2);
        for header in &headers {
            assert!(header.contains("HttpOnly"));
            assert!(header.contains("Secure"));
            assert!(header.contains("SameSite=Lax"));
        }
    }

    #[test]
    fn clear_ops_emit_expired_cookies() {
        let headers = rendered(&[CookieOp::ClearVerifier, CookieOp::ClearSession]);
        assert_eq!(headers.len(), 3);
        for header in &headers {
            assert!(header.contains("Max-Age=0"), "not a removal: {header}");
        }
    }

    #[test]
    fn insecure_mode_falls_back_to_lax_verifier() {
        let headers = render_ops(
            &[CookieOp::SetVerifier {
                value: "v".to_string(),
                max_age_secs: 60,
            }],
            &key(),
            false,
        );
        let header = headers[0].1.to_str().expect("value");
        assert!(header.contains("SameSite=Lax"));
        assert!(!header.contains("Secure"));
    }
}
