//! Catalog route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use clementine_core::Product;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::supabase::{ProductFilters, SortBy};

/// Default number of products per listing page.
const DEFAULT_PAGE_SIZE: u32 = 12;

/// Query parameters for the product listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub sort: Option<SortBy>,
}

/// Listing response: one page of products plus pagination metadata.
#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub products: Vec<Product>,
    pub page: u32,
    pub total: u64,
    pub total_pages: u64,
}

/// List products with pagination and filters.
///
/// # Route
///
/// `GET /products?page=1&category=kitchen&search=mug&sort=price-asc`
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>> {
    let page = query.page.unwrap_or(1).max(1);
    let page_size = query.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
    let filters = ProductFilters {
        category: query.category,
        search: query.search,
        sort: query.sort,
    };

    let result = state.data().products_page(page, page_size, &filters).await?;

    Ok(Json(ListResponse {
        products: result.products,
        page,
        total: result.total,
        total_pages: result.total_pages,
    }))
}

/// Distinct category list for the filter bar.
///
/// # Route
///
/// `GET /products/categories`
pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<String>>> {
    Ok(Json(state.data().categories().await?))
}

/// Product detail.
///
/// # Route
///
/// `GET /products/{id}`
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>> {
    state
        .data()
        .product_by_id(&id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound(id))
}
