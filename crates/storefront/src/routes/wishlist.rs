//! Wishlist route handlers.
//!
//! The wishlist stores full catalog products so a later move-to-cart needs
//! no catalog round trip. Toggle is the only way in: calling it twice with
//! the same product always lands back where it started.

use axum::{Extension, Json, extract::State};
use clementine_core::{CartableProduct, Product};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::middleware::ShopperSession;
use crate::state::AppState;
use crate::store::{CartStore, WishlistStore};

/// Request body naming a wishlist entry.
#[derive(Debug, Deserialize)]
pub struct WishlistItemRequest {
    pub product_id: String,
}

/// Wishlist contents as returned by every wishlist endpoint.
#[derive(Debug, Serialize)]
pub struct WishlistView {
    pub items: Vec<Product>,
    pub count: usize,
}

impl WishlistView {
    fn from_store(wishlist: &WishlistStore) -> Self {
        let snapshot = wishlist.snapshot();
        Self {
            count: snapshot.items.len(),
            items: snapshot.items,
        }
    }
}

fn open_wishlist(state: &AppState, session: &ShopperSession) -> WishlistStore {
    WishlistStore::open(state.snapshots(), session.wishlist_key())
}

/// Show the current wishlist.
///
/// # Route
///
/// `GET /wishlist`
pub async fn show(
    State(state): State<AppState>,
    Extension(session): Extension<ShopperSession>,
) -> Json<WishlistView> {
    let wishlist = open_wishlist(&state, &session);
    Json(WishlistView::from_store(&wishlist))
}

/// Toggle a product on the wishlist.
///
/// Adds the product when absent, removes it when present. The response
/// reports which of the two happened via `wishlisted`.
///
/// # Route
///
/// `POST /wishlist/toggle`
pub async fn toggle(
    State(state): State<AppState>,
    Extension(session): Extension<ShopperSession>,
    Json(request): Json<WishlistItemRequest>,
) -> Result<Json<serde_json::Value>> {
    let product = state
        .data()
        .product_by_id(&request.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(request.product_id.clone()))?;

    let wishlist = open_wishlist(&state, &session);
    let wishlisted = wishlist.toggle(&product);

    Ok(Json(serde_json::json!({
        "wishlisted": wishlisted,
        "count": wishlist.snapshot().items.len(),
    })))
}

/// Move a saved product into the cart.
///
/// Removes the product from the wishlist and adds one of it to the cart,
/// in that order. A product not on the wishlist is a no-op: the cart is
/// left untouched.
///
/// # Route
///
/// `POST /wishlist/move-to-cart`
pub async fn move_to_cart(
    State(state): State<AppState>,
    Extension(session): Extension<ShopperSession>,
    Json(request): Json<WishlistItemRequest>,
) -> Result<Json<serde_json::Value>> {
    let wishlist = open_wishlist(&state, &session);

    let moved = if let Some(product) = wishlist.remove(&request.product_id) {
        let cartable = CartableProduct::try_from(&product)?;
        let cart = CartStore::open(state.snapshots(), session.cart_key());
        cart.add_item(&cartable, 1);
        true
    } else {
        false
    };

    let cart = CartStore::open(state.snapshots(), session.cart_key());
    Ok(Json(serde_json::json!({
        "moved": moved,
        "wishlist_count": wishlist.snapshot().items.len(),
        "cart_count": cart.totals().item_count,
    })))
}

/// Empty the wishlist.
///
/// # Route
///
/// `POST /wishlist/clear`
pub async fn clear(
    State(state): State<AppState>,
    Extension(session): Extension<ShopperSession>,
) -> Json<WishlistView> {
    let wishlist = open_wishlist(&state, &session);
    wishlist.clear();
    Json(WishlistView::from_store(&wishlist))
}
