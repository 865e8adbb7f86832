//! OAuth PKCE handshake state machine.
//!
//! Pure functions only: the route handlers thread request data in and apply
//! the returned redirects and [`CookieOp`]s at the boundary. The flow per
//! login attempt is Initiated -> Callback -> Authenticated | Failed; both
//! terminal states delete the verifier cookie, and a new attempt always
//! starts with a fresh verifier.

use serde::Deserialize;
use thiserror::Error;

use super::cookies::CookieOp;
use super::pkce;

/// Identity providers offered for social login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Google,
    GitHub,
}

impl Provider {
    /// The provider slug used in routes and provider query parameters.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::GitHub => "github",
        }
    }
}

impl std::str::FromStr for Provider {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "google" => Ok(Self::Google),
            "github" => Ok(Self::GitHub),
            other => Err(UnknownProvider(other.to_string())),
        }
    }
}

/// Login attempted with a provider this storefront does not offer.
#[derive(Debug, Error)]
#[error("unknown oauth provider: {0}")]
pub struct UnknownProvider(pub String);

/// Terminal failure states of one handshake instance.
///
/// These map to generic redirect codes; provider error payloads are logged
/// server-side and never reach the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthFailure {
    /// The provider reported an authorization error.
    #[error("provider denied authorization")]
    ProviderDenied,

    /// Callback arrived without an authorization code.
    #[error("callback missing authorization code")]
    MissingCode,

    /// Callback arrived without a valid verifier cookie. Treated as a
    /// forged or expired flow; the exchange is never attempted.
    #[error("callback missing code verifier")]
    MissingVerifier,

    /// The provider rejected the code/verifier pair.
    #[error("code exchange failed")]
    ExchangeFailed,
}

impl AuthFailure {
    /// Generic error code for the login redirect.
    #[must_use]
    pub const fn error_code(self) -> &'static str {
        match self {
            Self::ProviderDenied => "provider_denied",
            Self::MissingCode => "missing_code",
            Self::MissingVerifier => "invalid_flow",
            Self::ExchangeFailed => "exchange_failed",
        }
    }

    /// Redirect target for the failed flow.
    #[must_use]
    pub fn redirect_target(self) -> String {
        format!("/login?error={}", self.error_code())
    }
}

/// A freshly initiated login attempt.
#[derive(Debug)]
pub struct LoginTicket {
    pub provider: Provider,
    pub challenge: String,
    verifier: String,
}

impl LoginTicket {
    /// Start a new handshake: fresh verifier, S256 challenge.
    #[must_use]
    pub fn begin(provider: Provider) -> Self {
        let verifier = pkce::generate_verifier();
        let challenge = pkce::challenge(&verifier);
        Self {
            provider,
            challenge,
            verifier,
        }
    }

    /// The cookie op storing the verifier for the callback request.
    ///
    /// The verifier itself never appears in a URL or response body.
    #[must_use]
    pub fn cookie_op(&self, ttl_secs: i64) -> CookieOp {
        CookieOp::SetVerifier {
            value: self.verifier.clone(),
            max_age_secs: ttl_secs,
        }
    }
}

/// Query parameters the provider sends to the callback endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// The exchange the callback handler must perform against the provider.
///
/// Constructing this value is the only way to reach the exchange step, so
/// a flow without a verifier can never call the provider.
#[derive(Debug, PartialEq, Eq)]
pub struct ExchangeRequest {
    pub code: String,
    pub verifier: String,
}

/// Decide what the callback request leads to, before any I/O.
///
/// Checked in order: provider-reported error, missing code, missing
/// verifier cookie. Only when all three pass does the flow proceed to the
/// code exchange.
///
/// # Errors
///
/// Returns the terminal [`AuthFailure`] for the flow instance.
pub fn plan_callback(
    params: &CallbackParams,
    verifier: Option<String>,
) -> Result<ExchangeRequest, AuthFailure> {
    if params.error.is_some() {
        return Err(AuthFailure::ProviderDenied);
    }
    let Some(code) = params.code.clone() else {
        return Err(AuthFailure::MissingCode);
    };
    let Some(verifier) = verifier else {
        return Err(AuthFailure::MissingVerifier);
    };
    Ok(ExchangeRequest { code, verifier })
}

/// Cookie ops for a successful exchange: set session tokens, then delete
/// the single-use verifier.
#[must_use]
pub fn success_cookie_ops(access_token: String, refresh_token: String) -> Vec<CookieOp> {
    vec![
        CookieOp::SetSession {
            access_token,
            refresh_token,
        },
        CookieOp::ClearVerifier,
    ]
}

/// Cookie ops for a failed flow: the verifier is deleted regardless.
#[must_use]
pub fn failure_cookie_ops() -> Vec<CookieOp> {
    vec![CookieOp::ClearVerifier]
}
