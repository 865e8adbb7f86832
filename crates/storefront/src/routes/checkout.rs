//! Checkout route handler.
//!
//! There is no payment integration behind this storefront; checkout
//! simulates a processing delay, mints an order id, and clears the cart.
//! An empty cart cannot be checked out.

use std::time::Duration;

use axum::{Extension, Json, extract::State};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::middleware::ShopperSession;
use crate::state::AppState;
use crate::store::CartStore;

/// How long the pretend payment processor takes.
const PROCESSING_DELAY_MS: u64 = 1200;

/// Receipt for a placed order.
#[derive(Debug, Serialize)]
pub struct OrderReceipt {
    pub order_id: String,
    pub total: Decimal,
    pub item_count: u64,
}

/// Place an order from the current cart.
///
/// # Route
///
/// `POST /checkout`
#[instrument(skip_all)]
pub async fn place_order(
    State(state): State<AppState>,
    Extension(session): Extension<ShopperSession>,
) -> Result<Json<OrderReceipt>> {
    let cart = CartStore::open(state.snapshots(), session.cart_key());
    let totals = cart.totals();

    if totals.item_count == 0 {
        return Err(AppError::BadRequest("cart is empty".to_string()));
    }

    // Simulated payment processing.
    tokio::time::sleep(Duration::from_millis(PROCESSING_DELAY_MS)).await;

    let order_id = Uuid::new_v4().to_string();
    cart.clear();

    crate::error::add_breadcrumb("checkout", "Placed order", Some(&[("order_id", &order_id)]));
    tracing::info!(order_id, item_count = totals.item_count, "order placed");

    Ok(Json(OrderReceipt {
        order_id,
        total: totals.total,
        item_count: totals.item_count,
    }))
}
