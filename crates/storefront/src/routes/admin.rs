//! Admin catalog API route handlers.
//!
//! Every handler requires the admin profile role. Inputs are validated
//! before the provider sees them; writes go through the service-role key
//! and invalidate the catalog cache.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use clementine_core::{Product, ProductInput};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::routes::products::ListResponse;
use crate::state::AppState;

/// Products per admin table page.
const ADMIN_PAGE_SIZE: u32 = 20;

/// Query parameters for the admin listing.
#[derive(Debug, Default, Deserialize)]
pub struct AdminListQuery {
    #[serde(default)]
    pub page: Option<u32>,
}

/// List products for the admin table, newest first.
///
/// # Route
///
/// `GET /api/admin/products?page=1`
#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Query(query): Query<AdminListQuery>,
) -> Result<Json<ListResponse>> {
    let page = query.page.unwrap_or(1).max(1);
    let result = state.data().admin_products_page(page, ADMIN_PAGE_SIZE).await?;

    Ok(Json(ListResponse {
        products: result.products,
        page,
        total: result.total,
        total_pages: result.total_pages,
    }))
}

/// Create a catalog product.
///
/// # Route
///
/// `POST /api/admin/products`
#[instrument(skip(state, admin, input))]
pub async fn create(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Json(input): Json<ProductInput>,
) -> Result<(StatusCode, Json<Product>)> {
    input.validate()?;

    let product = state.data().create_product(&input).await?;
    tracing::info!(
        product_id = %product.id,
        admin_id = %admin.0.id,
        "product created"
    );

    Ok((StatusCode::CREATED, Json(product)))
}

/// Update a catalog product.
///
/// # Route
///
/// `PATCH /api/admin/products/{id}`
#[instrument(skip(state, admin, input))]
pub async fn update(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<String>,
    Json(input): Json<ProductInput>,
) -> Result<Json<Product>> {
    input.validate()?;

    let product = state
        .data()
        .update_product(&id, &input)
        .await?
        .ok_or_else(|| AppError::NotFound(id.clone()))?;
    tracing::info!(product_id = %id, admin_id = %admin.0.id, "product updated");

    Ok(Json(product))
}

/// Delete a catalog product.
///
/// # Route
///
/// `DELETE /api/admin/products/{id}`
#[instrument(skip(state, admin))]
pub async fn remove(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    if state.data().delete_product(&id).await? {
        tracing::info!(product_id = %id, admin_id = %admin.0.id, "product deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(id))
    }
}
