//! Clementine Core - Shared types library.
//!
//! This crate provides common types used across the Clementine storefront:
//! the full catalog product record, the narrow cartable interface the
//! cart/wishlist stores consume, and validated admin product input.
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be
//! used anywhere.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
