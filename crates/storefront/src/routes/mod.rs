//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                  - Health check
//!
//! # Catalog
//! GET  /products                - Paged product listing (category/search/sort)
//! GET  /products/categories     - Distinct category list
//! GET  /products/{id}           - Product detail
//!
//! # Cart (per-shopper, keyed by the clm_sid cookie)
//! GET  /cart                    - Cart contents plus totals
//! GET  /cart/count              - Item count badge
//! POST /cart/add                - Add a product (merges quantity by id)
//! POST /cart/update             - Set a line's quantity
//! POST /cart/remove             - Remove a line
//! POST /cart/clear              - Empty the cart
//!
//! # Wishlist
//! GET  /wishlist                - Wishlist contents
//! POST /wishlist/toggle         - Add or remove a product
//! POST /wishlist/move-to-cart   - Move a saved product into the cart
//! POST /wishlist/clear          - Empty the wishlist
//!
//! # Checkout
//! POST /checkout                - Place an order from the current cart
//!
//! # OAuth (PKCE)
//! GET  /auth/oauth/{provider}   - Redirect to the provider authorize page
//! GET  /auth/callback           - Handle the provider callback
//!
//! # Auth API
//! POST /api/auth/login          - Email/password login
//! POST /api/auth/signup         - Account registration
//! POST /api/auth/logout         - Logout
//! GET  /api/auth/me             - Current user, if any
//!
//! # Admin API (requires the admin profile role)
//! GET    /api/admin/products        - Paged catalog listing
//! POST   /api/admin/products        - Create a product
//! PATCH  /api/admin/products/{id}   - Update a product
//! DELETE /api/admin/products/{id}   - Delete a product
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod oauth;
pub mod products;
pub mod wishlist;

use axum::{
    Router,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use crate::auth::CookieOp;
use crate::auth::cookies::render_ops;
use crate::state::AppState;

/// Attach rendered cookie ops to a response.
pub(crate) fn with_cookie_ops(
    response: impl IntoResponse,
    ops: &[CookieOp],
    state: &AppState,
) -> Response {
    let mut response = response.into_response();
    for (name, value) in render_ops(ops, state.cookie_key(), state.config().is_secure()) {
        response.headers_mut().append(name, value);
    }
    response
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/categories", get(products::categories))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/count", get(cart::count))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::show))
        .route("/toggle", post(wishlist::toggle))
        .route("/move-to-cart", post(wishlist::move_to_cart))
        .route("/clear", post(wishlist::clear))
}

/// Create the OAuth routes router.
pub fn oauth_routes() -> Router<AppState> {
    Router::new()
        .route("/oauth/{provider}", get(oauth::begin))
        .route("/callback", get(oauth::callback))
}

/// Create the auth API routes router.
pub fn auth_api_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/signup", post(auth::signup))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

/// Create the admin API routes router.
pub fn admin_api_routes() -> Router<AppState> {
    use axum::routing::patch;

    Router::new()
        .route("/products", get(admin::index).post(admin::create))
        .route("/products/{id}", patch(admin::update).delete(admin::remove))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/wishlist", wishlist_routes())
        .route("/checkout", post(checkout::place_order))
        .nest("/auth", oauth_routes())
        .nest("/api/auth", auth_api_routes())
        .nest("/api/admin", admin_api_routes())
}
