//! Menu browsing: categories and products.
//!
//! Read-only data, cached with a TTL the way live cart/order state never
//! is. Cache keys are strings so one cache serves every catalog shape.

use datmon_core::{Category, CategoryId, Product, ProductId};
use tracing::instrument;

use crate::error::ApiError;

use super::ApiClient;

/// Cached catalog value types.
#[derive(Debug, Clone)]
pub(super) enum CacheValue {
    Categories(Vec<Category>),
    Products(Vec<Product>),
    Product(Box<Product>),
}

impl ApiClient {
    /// List the menu categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        let cache_key = "categories".to_string();

        if let Some(CacheValue::Categories(categories)) = self.inner.cache.get(&cache_key).await {
            return Ok(categories);
        }

        let categories: Vec<Category> = self.send_json(self.get("api/categories")?).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Categories(categories.clone()))
            .await;

        Ok(categories)
    }

    /// List products, optionally filtered to a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn products(&self, category: Option<CategoryId>) -> Result<Vec<Product>, ApiError> {
        let cache_key = match category {
            Some(id) => format!("products:{id}"),
            None => "products".to_string(),
        };

        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            return Ok(products);
        }

        let mut builder = self.get("api/products")?;
        if let Some(id) = category {
            builder = builder.query(&[("categoryId", id.as_i64())]);
        }
        let products: Vec<Product> = self.send_json(builder).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// Fetch a single product.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the product does not exist.
    #[instrument(skip(self))]
    pub async fn product(&self, id: ProductId) -> Result<Product, ApiError> {
        let cache_key = format!("product:{id}");

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            return Ok(*product);
        }

        let product: Product = self.send_json(self.get(&format!("api/products/{id}"))?).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }
}
