//! Cart route handlers.
//!
//! Every handler opens the shopper's cart from its snapshot, mutates it,
//! and returns the resulting cart as JSON. Totals are always derived from
//! the lines server-side; clients never send prices.

use axum::{Extension, Json, extract::State};
use clementine_core::CartableProduct;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::middleware::ShopperSession;
use crate::state::AppState;
use crate::store::{CartLine, CartStore};

/// Request body naming a product line.
#[derive(Debug, Deserialize)]
pub struct CartItemRequest {
    pub product_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

const fn default_quantity() -> u32 {
    1
}

/// Cart contents plus derived totals, as returned by every cart endpoint.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Vec<CartLine>,
    pub total: Decimal,
    pub item_count: u64,
}

impl CartView {
    fn from_store(cart: &CartStore) -> Self {
        let snapshot = cart.snapshot();
        let totals = snapshot.totals();
        Self {
            items: snapshot.items,
            total: totals.total,
            item_count: totals.item_count,
        }
    }
}

fn open_cart(state: &AppState, session: &ShopperSession) -> CartStore {
    CartStore::open(state.snapshots(), session.cart_key())
}

/// Show the current cart.
///
/// # Route
///
/// `GET /cart`
pub async fn show(
    State(state): State<AppState>,
    Extension(session): Extension<ShopperSession>,
) -> Json<CartView> {
    let cart = open_cart(&state, &session);
    Json(CartView::from_store(&cart))
}

/// Item count for the cart badge.
///
/// # Route
///
/// `GET /cart/count`
pub async fn count(
    State(state): State<AppState>,
    Extension(session): Extension<ShopperSession>,
) -> Json<serde_json::Value> {
    let cart = open_cart(&state, &session);
    Json(serde_json::json!({ "count": cart.totals().item_count }))
}

/// Add a product to the cart.
///
/// The product is fetched from the catalog so the stored line carries the
/// authoritative name and price. Adding an id already in the cart merges
/// quantities instead of creating a second line.
///
/// # Route
///
/// `POST /cart/add`
pub async fn add(
    State(state): State<AppState>,
    Extension(session): Extension<ShopperSession>,
    Json(request): Json<CartItemRequest>,
) -> Result<Json<CartView>> {
    let product = state
        .data()
        .product_by_id(&request.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(request.product_id.clone()))?;

    let cartable = CartableProduct::try_from(&product)?;

    let cart = open_cart(&state, &session);
    cart.add_item(&cartable, request.quantity);

    crate::error::add_breadcrumb(
        "cart",
        "Added product to cart",
        Some(&[("product_id", &request.product_id)]),
    );

    Ok(Json(CartView::from_store(&cart)))
}

/// Set the quantity of a cart line.
///
/// Quantities clamp to a minimum of one; removal is its own endpoint. An
/// id not present in the cart is a no-op.
///
/// # Route
///
/// `POST /cart/update`
pub async fn update(
    State(state): State<AppState>,
    Extension(session): Extension<ShopperSession>,
    Json(request): Json<CartItemRequest>,
) -> Json<CartView> {
    let cart = open_cart(&state, &session);
    cart.update_quantity(&request.product_id, request.quantity);
    Json(CartView::from_store(&cart))
}

/// Remove a line from the cart. Idempotent.
///
/// # Route
///
/// `POST /cart/remove`
pub async fn remove(
    State(state): State<AppState>,
    Extension(session): Extension<ShopperSession>,
    Json(request): Json<CartItemRequest>,
) -> Json<CartView> {
    let cart = open_cart(&state, &session);
    cart.remove_item(&request.product_id);
    Json(CartView::from_store(&cart))
}

/// Empty the cart.
///
/// # Route
///
/// `POST /cart/clear`
pub async fn clear(
    State(state): State<AppState>,
    Extension(session): Extension<ShopperSession>,
) -> Json<CartView> {
    let cart = open_cart(&state, &session);
    cart.clear();
    Json(CartView::from_store(&cart))
}
