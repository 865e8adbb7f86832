//! Wire types for the provider auth endpoints.

use serde::{Deserialize, Serialize};

/// Token payload from the GoTrue token endpoint.
///
/// The tokens are opaque: this storefront stores them in cookies and hands
/// them back to the provider, never interpreting or refreshing them itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub user: Option<AuthUser>,
}

/// The provider's view of an authenticated user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: serde_json::Value,
    #[serde(default)]
    pub app_metadata: serde_json::Value,
}

impl AuthUser {
    /// Display name from signup metadata, falling back to the email.
    #[must_use]
    pub fn display_name(&self) -> Option<String> {
        self.user_metadata
            .get("full_name")
            .and_then(|v| v.as_str())
            .map(String::from)
            .or_else(|| self.email.clone())
    }
}

/// Signup response: a full session when email confirmation is disabled,
/// otherwise just the pending user record.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SignupOutcome {
    Session(TokenResponse),
    User(AuthUser),
}

impl SignupOutcome {
    /// The user record regardless of confirmation mode.
    #[must_use]
    pub const fn user(&self) -> Option<&AuthUser> {
        match self {
            Self::Session(token) => token.user.as_ref(),
            Self::User(user) => Some(user),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signup_outcome_parses_session_shape() {
        let json = r#"{
            "access_token": "at",
            "refresh_token": "rt",
            "expires_in": 3600,
            "user": { "id": "u1", "email": "a@b.c" }
        }"#;
        let outcome: SignupOutcome = serde_json::from_str(json).expect("parse");
        assert!(matches!(outcome, SignupOutcome::Session(_)));
        assert_eq!(outcome.user().map(|u| u.id.as_str()), Some("u1"));
    }

    #[test]
    fn signup_outcome_parses_bare_user_shape() {
        let json = r#"{ "id": "u2", "email": "x@y.z" }"#;
        let outcome: SignupOutcome = serde_json::from_str(json).expect("parse");
        assert!(matches!(outcome, SignupOutcome::User(_)));
        assert_eq!(outcome.user().map(|u| u.id.as_str()), Some("u2"));
    }

    #[test]
    fn display_name_prefers_metadata() {
        let user: AuthUser = serde_json::from_str(
            r#"{ "id": "u1", "email": "a@b.c", "user_metadata": { "full_name": "Ada" } }"#,
        )
        .expect("parse");
        assert_eq!(user.display_name(), Some("Ada".to_string()));
    }
}
