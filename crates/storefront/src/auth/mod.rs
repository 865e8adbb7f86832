//! OAuth PKCE authentication machinery.
//!
//! Split into three layers: [`pkce`] generates verifier/challenge pairs,
//! [`handshake`] is the pure per-attempt state machine, and [`cookies`]
//! turns the machine's cookie effects into headers at the HTTP boundary.
//! The route handlers in `routes::oauth` glue these to the provider client.

pub mod cookies;
pub mod handshake;
pub mod pkce;

pub use cookies::CookieOp;
pub use handshake::{AuthFailure, CallbackParams, LoginTicket, Provider};
