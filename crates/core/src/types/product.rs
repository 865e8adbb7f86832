//! Catalog product types and boundary validation.
//!
//! The catalog [`Product`] carries everything the provider stores. The cart
//! and wishlist stores never consume it directly: cart lines are built from
//! the narrow [`CartableProduct`] view, validated once at the boundary, so
//! the stores stay decoupled from the catalog record's optional fields.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced when validating product data at a boundary.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProductError {
    /// A required text field was empty.
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    /// Price was negative.
    #[error("price must not be negative (got {0})")]
    NegativePrice(Decimal),

    /// Stock was negative.
    #[error("stock must not be negative (got {0})")]
    NegativeStock(i64),
}

/// A full catalog product record as stored by the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub brand: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub image_urls: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// The narrow product view the cart store consumes.
///
/// Built from a [`Product`] via `TryFrom`, which is the single place the
/// id/name/price invariants are checked before a line item can exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartableProduct {
    pub id: String,
    pub name: String,
    pub price: Decimal,
    pub image_ref: String,
}

impl TryFrom<&Product> for CartableProduct {
    type Error = ProductError;

    fn try_from(product: &Product) -> Result<Self, Self::Error> {
        if product.id.trim().is_empty() {
            return Err(ProductError::EmptyField("id"));
        }
        if product.name.trim().is_empty() {
            return Err(ProductError::EmptyField("name"));
        }
        if product.price.is_sign_negative() {
            return Err(ProductError::NegativePrice(product.price));
        }

        Ok(Self {
            id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            image_ref: product.image_urls.clone(),
        })
    }
}

/// Admin input for creating or updating a catalog product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductInput {
    pub name: String,
    pub price: Decimal,
    pub stock: i64,
    pub category: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_urls: Option<String>,
}

impl ProductInput {
    /// Validate the input against the catalog invariants.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant: empty name/category, negative
    /// price, or negative stock.
    pub fn validate(&self) -> Result<(), ProductError> {
        if self.name.trim().is_empty() {
            return Err(ProductError::EmptyField("name"));
        }
        if self.category.trim().is_empty() {
            return Err(ProductError::EmptyField("category"));
        }
        if self.price.is_sign_negative() {
            return Err(ProductError::NegativePrice(self.price));
        }
        if self.stock < 0 {
            return Err(ProductError::NegativeStock(self.stock));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product() -> Product {
        Product {
            id: "p1".to_string(),
            name: "Mug".to_string(),
            brand: "Clementine".to_string(),
            category: "kitchen".to_string(),
            description: "A mug".to_string(),
            price: Decimal::new(999, 2),
            stock: 10,
            rating: 4.5,
            tags: vec![],
            image_urls: "https://img.example/mug.jpg".to_string(),
            created_at: None,
        }
    }

    #[test]
    fn cartable_from_valid_product() {
        let cartable = CartableProduct::try_from(&product()).expect("valid");
        assert_eq!(cartable.id, "p1");
        assert_eq!(cartable.price, Decimal::new(999, 2));
        assert_eq!(cartable.image_ref, "https://img.example/mug.jpg");
    }

    #[test]
    fn cartable_rejects_blank_id() {
        let mut p = product();
        p.id = "  ".to_string();
        assert_eq!(
            CartableProduct::try_from(&p),
            Err(ProductError::EmptyField("id"))
        );
    }

    #[test]
    fn cartable_rejects_negative_price() {
        let mut p = product();
        p.price = Decimal::new(-1, 0);
        assert!(matches!(
            CartableProduct::try_from(&p),
            Err(ProductError::NegativePrice(_))
        ));
    }

    #[test]
    fn input_validation() {
        let input = ProductInput {
            name: "Mug".to_string(),
            price: Decimal::new(5, 0),
            stock: 3,
            category: "kitchen".to_string(),
            brand: None,
            description: None,
            image_urls: None,
        };
        assert!(input.validate().is_ok());

        let mut bad = input.clone();
        bad.name = String::new();
        assert_eq!(bad.validate(), Err(ProductError::EmptyField("name")));

        let mut bad = input.clone();
        bad.stock = -1;
        assert_eq!(bad.validate(), Err(ProductError::NegativeStock(-1)));

        let mut bad = input;
        bad.price = Decimal::new(-1, 2);
        assert!(matches!(
            bad.validate(),
            Err(ProductError::NegativePrice(_))
        ));
    }
}
