//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Shopper session (ensure the `clm_sid` cookie exists)
//! 5. Security headers (CSP, isolation, no-store)

pub mod auth;
pub mod request_id;
pub mod security_headers;
pub mod store_session;

pub use auth::{OptionalUser, RequireAdmin, RequireUser};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use store_session::{ShopperSession, store_session_middleware};
