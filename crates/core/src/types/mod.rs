//! Core types for Clementine.

pub mod product;

pub use product::{CartableProduct, Product, ProductError, ProductInput};
