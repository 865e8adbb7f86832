//! PKCE code verifier and challenge generation (RFC 7636).
//!
//! The verifier is a high-entropy random string from the unreserved
//! character set; the challenge is always the S256 transform. The `plain`
//! method is never emitted: it defeats PKCE whenever the authorization
//! endpoint or network path is only partially trusted.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;
use sha2::{Digest, Sha256};

/// Verifier length in characters. RFC 7636 requires 43..=128.
pub const VERIFIER_LENGTH: usize = 64;

/// The only challenge method this storefront will ever send, in the
/// RFC 7636 registered spelling.
pub const CHALLENGE_METHOD: &str = "S256";

/// Generate a cryptographically random code verifier.
#[must_use]
pub fn generate_verifier() -> String {
    // RFC 7636 unreserved characters.
    const CHARSET: &[u8] =
        b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";
    let mut rng = rand::rng();
    (0..VERIFIER_LENGTH)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            // SAFETY: idx is always within bounds since random_range returns 0..CHARSET.len()
            char::from(*CHARSET.get(idx).expect("idx within bounds"))
        })
        .collect()
}

/// Derive the S256 code challenge: `BASE64URL(SHA256(verifier))`, unpadded.
#[must_use]
pub fn challenge(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}
