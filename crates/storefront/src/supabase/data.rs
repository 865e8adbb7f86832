//! PostgREST data client: catalog reads, profile lookups, admin writes.
//!
//! Reads use the anon key and are cached for 60 seconds; admin writes and
//! profile role lookups use the service-role key and bypass the cache
//! (writes invalidate it).

use std::sync::Arc;
use std::time::Duration;

use clementine_core::{Product, ProductInput};
use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, instrument};

use super::SupabaseError;
use crate::config::SupabaseConfig;

/// Page size cap, mirroring the provider's own sane default.
const MAX_PAGE_SIZE: u32 = 100;

/// Cache key for catalog reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    Product(String),
    Categories,
}

/// Cached value types.
#[derive(Clone)]
enum CacheValue {
    Product(Arc<Product>),
    Categories(Arc<Vec<String>>),
}

/// Sort orders the catalog listing supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortBy {
    PriceAsc,
    PriceDesc,
    Rating,
    Newest,
}

impl SortBy {
    /// The PostgREST `order` parameter for this sort.
    #[must_use]
    pub const fn order_param(self) -> &'static str {
        match self {
            Self::PriceAsc => "price.asc",
            Self::PriceDesc => "price.desc",
            Self::Rating => "rating.desc",
            Self::Newest => "created_at.desc",
        }
    }
}

/// Catalog listing filters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilters {
    pub category: Option<String>,
    pub search: Option<String>,
    pub sort: Option<SortBy>,
}

/// One page of catalog results plus pagination totals.
#[derive(Debug, Clone)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub total: u64,
    pub total_pages: u64,
}

/// Client for the provider's PostgREST endpoints.
#[derive(Clone)]
pub struct DataClient {
    inner: Arc<DataClientInner>,
}

struct DataClientInner {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
    service_role_key: SecretString,
    cache: Cache<CacheKey, CacheValue>,
}

impl DataClient {
    /// Create a new data client.
    #[must_use]
    pub fn new(config: &SupabaseConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(60))
            .build();

        Self {
            inner: Arc::new(DataClientInner {
                client: reqwest::Client::new(),
                base_url: config.url.trim_end_matches('/').to_string(),
                anon_key: config.anon_key.clone(),
                service_role_key: config.service_role_key.clone(),
                cache,
            }),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.inner.base_url)
    }

    fn read(&self, url: &str) -> reqwest::RequestBuilder {
        self.inner
            .client
            .get(url)
            .header("apikey", &self.inner.anon_key)
            .bearer_auth(&self.inner.anon_key)
    }

    fn admin(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let key = self.inner.service_role_key.expose_secret();
        builder.header("apikey", key).bearer_auth(key)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Catalog reads
    // ─────────────────────────────────────────────────────────────────────

    /// Fetch one product by id, from cache when possible.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider request fails.
    #[instrument(skip(self))]
    pub async fn product_by_id(&self, id: &str) -> Result<Option<Product>, SupabaseError> {
        let key = CacheKey::Product(id.to_string());
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&key).await {
            debug!(id, "product cache hit");
            return Ok(Some((*product).clone()));
        }

        let id_filter = format!("eq.{id}");
        let response = self
            .read(&self.table_url("products"))
            .query(&[("select", "*"), ("id", id_filter.as_str()), ("limit", "1")])
            .send()
            .await?;
        let mut rows: Vec<Product> = Self::decode(response).await?;

        let Some(product) = rows.pop() else {
            return Ok(None);
        };
        self.inner
            .cache
            .insert(key, CacheValue::Product(Arc::new(product.clone())))
            .await;
        Ok(Some(product))
    }

    /// Fetch a page of products with filters and an exact total.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider request fails.
    #[instrument(skip(self))]
    pub async fn products_page(
        &self,
        page: u32,
        page_size: u32,
        filters: &ProductFilters,
    ) -> Result<ProductPage, SupabaseError> {
        let page = page.max(1);
        let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        let offset = u64::from(page - 1) * u64::from(page_size);

        let mut params: Vec<(&str, String)> = vec![
            ("select", "*".to_string()),
            ("limit", page_size.to_string()),
            ("offset", offset.to_string()),
        ];
        if let Some(category) = filters
            .category
            .as_deref()
            .filter(|c| !c.is_empty() && *c != "all")
        {
            params.push(("category", format!("eq.{category}")));
        }
        if let Some(search) = filters.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            // Commas and parens would change the or= grammar; strip them
            // rather than erroring on user input.
            let clean: String = search.chars().filter(|c| !",()".contains(*c)).collect();
            params.push((
                "or",
                format!("(name.ilike.*{clean}*,description.ilike.*{clean}*)"),
            ));
        }
        if let Some(sort) = filters.sort {
            params.push(("order", sort.order_param().to_string()));
        }

        let response = self
            .read(&self.table_url("products"))
            .query(&params)
            .header("Prefer", "count=exact")
            .send()
            .await?;

        let total = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total)
            .unwrap_or(0);
        let products: Vec<Product> = Self::decode(response).await?;

        Ok(ProductPage {
            products,
            total,
            total_pages: total_pages(total, page_size),
        })
    }

    /// Distinct category list, prefixed with `"all"`.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider request fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<String>, SupabaseError> {
        if let Some(CacheValue::Categories(cached)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            debug!("categories cache hit");
            return Ok((*cached).clone());
        }

        #[derive(Deserialize)]
        struct Row {
            category: String,
        }

        let response = self
            .read(&self.table_url("products"))
            .query(&[("select", "category")])
            .send()
            .await?;
        let rows: Vec<Row> = Self::decode(response).await?;

        let mut categories: Vec<String> = vec!["all".to_string()];
        for row in rows {
            if !categories.contains(&row.category) {
                categories.push(row.category);
            }
        }

        self.inner
            .cache
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(Arc::new(categories.clone())),
            )
            .await;
        Ok(categories)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Profiles
    // ─────────────────────────────────────────────────────────────────────

    /// Role from the `profiles` table for a user id, if any.
    ///
    /// Uses the service-role key: row-level security hides profiles from
    /// the anon role.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider request fails.
    #[instrument(skip(self))]
    pub async fn profile_role(&self, user_id: &str) -> Result<Option<String>, SupabaseError> {
        #[derive(Deserialize)]
        struct Row {
            role: Option<String>,
        }

        let id_filter = format!("eq.{user_id}");
        let response = self
            .admin(self.inner.client.get(self.table_url("profiles")))
            .query(&[
                ("select", "role"),
                ("id", id_filter.as_str()),
                ("limit", "1"),
            ])
            .send()
            .await?;
        let mut rows: Vec<Row> = Self::decode(response).await?;
        Ok(rows.pop().and_then(|r| r.role))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Admin catalog writes
    // ─────────────────────────────────────────────────────────────────────

    /// Page of products for the admin table, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider request fails.
    #[instrument(skip(self))]
    pub async fn admin_products_page(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<ProductPage, SupabaseError> {
        self.products_page(
            page,
            page_size,
            &ProductFilters {
                sort: Some(SortBy::Newest),
                ..ProductFilters::default()
            },
        )
        .await
    }

    /// Insert a catalog product and return the stored row.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider rejects the insert.
    #[instrument(skip(self, input))]
    pub async fn create_product(&self, input: &ProductInput) -> Result<Product, SupabaseError> {
        let response = self
            .admin(self.inner.client.post(self.table_url("products")))
            .header("Prefer", "return=representation")
            .json(input)
            .send()
            .await?;
        let mut rows: Vec<Product> = Self::decode(response).await?;
        let product = rows
            .pop()
            .ok_or_else(|| SupabaseError::Decode("insert returned no row".to_string()))?;
        self.invalidate(&product.id).await;
        Ok(product)
    }

    /// Update a catalog product. Returns `None` when the id does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider rejects the update.
    #[instrument(skip(self, input))]
    pub async fn update_product(
        &self,
        id: &str,
        input: &ProductInput,
    ) -> Result<Option<Product>, SupabaseError> {
        let response = self
            .admin(self.inner.client.patch(self.table_url("products")))
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=representation")
            .json(input)
            .send()
            .await?;
        let mut rows: Vec<Product> = Self::decode(response).await?;
        self.invalidate(id).await;
        Ok(rows.pop())
    }

    /// Delete a catalog product. Returns `false` when the id did not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider rejects the delete.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: &str) -> Result<bool, SupabaseError> {
        let response = self
            .admin(self.inner.client.delete(self.table_url("products")))
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=representation")
            .send()
            .await?;
        let rows: Vec<Product> = Self::decode(response).await?;
        self.invalidate(id).await;
        Ok(!rows.is_empty())
    }

    async fn invalidate(&self, id: &str) {
        self.inner
            .cache
            .invalidate(&CacheKey::Product(id.to_string()))
            .await;
        self.inner.cache.invalidate(&CacheKey::Categories).await;
    }

    async fn decode<T: for<'de> Deserialize<'de>>(
        response: reqwest::Response,
    ) -> Result<T, SupabaseError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SupabaseError::from_body(status.as_u16(), &body));
        }
        Ok(response.json().await?)
    }
}

/// Parse the total from a PostgREST `Content-Range` header (`0-11/100`).
fn parse_content_range_total(value: &str) -> Option<u64> {
    value.rsplit_once('/')?.1.parse().ok()
}

/// Total pages for a count and page size, never less than one.
fn total_pages(total: u64, page_size: u32) -> u64 {
    let size = u64::from(page_size.max(1));
    total.div_ceil(size).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_range_total_parses() {
        assert_eq!(parse_content_range_total("0-11/100"), Some(100));
        assert_eq!(parse_content_range_total("*/0"), Some(0));
        assert_eq!(parse_content_range_total("garbage"), None);
    }

    #[test]
    fn total_pages_rounds_up_and_floors_at_one() {
        assert_eq!(total_pages(0, 12), 1);
        assert_eq!(total_pages(12, 12), 1);
        assert_eq!(total_pages(13, 12), 2);
        assert_eq!(total_pages(100, 12), 9);
    }

    #[test]
    fn sort_params_match_catalog_columns() {
        assert_eq!(SortBy::PriceAsc.order_param(), "price.asc");
        assert_eq!(SortBy::PriceDesc.order_param(), "price.desc");
        assert_eq!(SortBy::Rating.order_param(), "rating.desc");
        assert_eq!(SortBy::Newest.order_param(), "created_at.desc");
    }

    #[test]
    fn sort_deserializes_from_kebab_case() {
        let filters: ProductFilters =
            serde_json::from_str(r#"{ "sort": "price-asc", "category": "kitchen" }"#)
                .expect("parse");
        assert_eq!(filters.sort, Some(SortBy::PriceAsc));
    }
}
