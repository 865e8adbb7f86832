//! GoTrue auth client.
//!
//! Covers the password grant, signup, logout, the OAuth authorize URL and
//! the PKCE code exchange. The PKCE pieces are deliberately dumb: verifier
//! and challenge handling live in `crate::auth`, this client only moves
//! them over the wire.

use std::sync::Arc;

use serde::Deserialize;
use tracing::instrument;

use super::types::{AuthUser, SignupOutcome, TokenResponse};
use super::SupabaseError;
use crate::auth::Provider;
use crate::config::SupabaseConfig;

/// Client for the provider's auth (GoTrue) endpoints.
#[derive(Clone)]
pub struct AuthClient {
    inner: Arc<AuthClientInner>,
}

struct AuthClientInner {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl AuthClient {
    /// Create a new auth client.
    #[must_use]
    pub fn new(config: &SupabaseConfig) -> Self {
        Self {
            inner: Arc::new(AuthClientInner {
                client: reqwest::Client::new(),
                base_url: config.url.trim_end_matches('/').to_string(),
                anon_key: config.anon_key.clone(),
            }),
        }
    }

    /// Build the provider authorization URL for a PKCE login.
    ///
    /// `redirect_to` must be derived from the incoming request's own origin
    /// so preview/staging/prod deployments never cross-redirect. The
    /// challenge method is always S256.
    #[must_use]
    pub fn authorize_url(&self, provider: Provider, redirect_to: &str, challenge: &str) -> String {
        format!(
            "{}/auth/v1/authorize?provider={}&redirect_to={}&code_challenge={}&code_challenge_method={}",
            self.inner.base_url,
            provider.as_str(),
            urlencoding::encode(redirect_to),
            urlencoding::encode(challenge),
            crate::auth::pkce::CHALLENGE_METHOD,
        )
    }

    /// Exchange an authorization code plus its verifier for session tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider rejects the code/verifier pair
    /// (expired, reused, mismatched) or the request fails.
    #[instrument(skip(self, code, verifier))]
    pub async fn exchange_code(
        &self,
        code: &str,
        verifier: &str,
    ) -> Result<TokenResponse, SupabaseError> {
        self.token_request(
            "pkce",
            &serde_json::json!({
                "auth_code": code,
                "code_verifier": verifier,
            }),
        )
        .await
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns an error when the credentials are rejected or the request
    /// fails.
    #[instrument(skip(self, password))]
    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<TokenResponse, SupabaseError> {
        self.token_request(
            "password",
            &serde_json::json!({
                "email": email,
                "password": password,
            }),
        )
        .await
    }

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Returns an error when the provider rejects the signup (e.g. the
    /// email is already registered) or the request fails.
    #[instrument(skip(self, password))]
    pub async fn sign_up(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
    ) -> Result<SignupOutcome, SupabaseError> {
        let url = format!("{}/auth/v1/signup", self.inner.base_url);
        let response = self
            .inner
            .client
            .post(&url)
            .header("apikey", &self.inner.anon_key)
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "data": { "full_name": full_name },
            }))
            .send()
            .await?;

        Self::decode(response).await
    }

    /// Revoke the session behind `access_token`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; an already-dead token is not
    /// an error worth surfacing and is mapped to `Ok`.
    #[instrument(skip(self, access_token))]
    pub async fn sign_out(&self, access_token: &str) -> Result<(), SupabaseError> {
        let url = format!("{}/auth/v1/logout", self.inner.base_url);
        let response = self
            .inner
            .client
            .post(&url)
            .header("apikey", &self.inner.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() || status.as_u16() == 401 {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(SupabaseError::from_body(status.as_u16(), &body))
    }

    /// Fetch the user behind `access_token`, or `None` if the token is no
    /// longer valid.
    ///
    /// # Errors
    ///
    /// Returns an error only for transport or unexpected provider failures;
    /// an expired/invalid token is `Ok(None)`.
    #[instrument(skip(self, access_token))]
    pub async fn get_user(&self, access_token: &str) -> Result<Option<AuthUser>, SupabaseError> {
        let url = format!("{}/auth/v1/user", self.inner.base_url);
        let response = self
            .inner
            .client
            .get(&url)
            .header("apikey", &self.inner.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SupabaseError::from_body(status.as_u16(), &body));
        }
        Ok(Some(response.json().await?))
    }

    async fn token_request(
        &self,
        grant_type: &str,
        body: &serde_json::Value,
    ) -> Result<TokenResponse, SupabaseError> {
        let url = format!(
            "{}/auth/v1/token?grant_type={grant_type}",
            self.inner.base_url
        );
        let response = self
            .inner
            .client
            .post(&url)
            .header("apikey", &self.inner.anon_key)
            .json(body)
            .send()
            .await?;

        Self::decode(response).await
    }

    async fn decode<T: for<'de> Deserialize<'de>>(
        response: reqwest::Response,
    ) -> Result<T, SupabaseError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SupabaseError::from_body(status.as_u16(), &body));
        }
        Ok(response.json().await?)
    }
}
