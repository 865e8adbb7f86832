//! Supabase provider clients.
//!
//! # Architecture
//!
//! - Supabase is source of truth for identity and catalog data - NO local
//!   sync, direct REST calls
//! - [`AuthClient`] talks to the GoTrue auth endpoints (`/auth/v1/*`):
//!   password grant, signup, logout, OAuth authorize URL, PKCE exchange
//! - [`DataClient`] talks to the PostgREST endpoints (`/rest/v1/*`):
//!   catalog reads with the anon key, admin writes and profile role lookups
//!   with the service-role key
//! - Catalog reads are cached in-memory via `moka` (60 second TTL)

pub mod auth;
pub mod data;
pub mod types;

pub use auth::AuthClient;
pub use data::{DataClient, ProductFilters, ProductPage, SortBy};
pub use types::{AuthUser, SignupOutcome, TokenResponse};

use thiserror::Error;

/// Errors that can occur when interacting with the provider APIs.
#[derive(Debug, Error)]
pub enum SupabaseError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider returned a non-success status.
    #[error("provider error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Response body did not match the expected shape.
    #[error("unexpected provider response: {0}")]
    Decode(String),
}

impl SupabaseError {
    /// Build an [`SupabaseError::Api`] from an error response body.
    ///
    /// GoTrue bodies carry `error_description` or `msg`; PostgREST bodies
    /// carry `message`. Fall back to the raw body, truncated.
    #[must_use]
    pub fn from_body(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| {
                ["error_description", "msg", "message", "error"]
                    .iter()
                    .find_map(|k| v.get(k).and_then(|m| m.as_str()).map(String::from))
            })
            .unwrap_or_else(|| body.chars().take(200).collect());
        Self::Api { status, message }
    }

    /// Status code the provider responded with, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
