//! Products, categories, brands and reviews.

use bestdeal_core::{ApiToken, ProductId};
use reqwest::Method;
use tracing::{debug, instrument};

use super::cache::{CacheKey, CacheValue};
use super::types::{
    Brand, Category, NameInput, Product, ProductInput, ProductListResponse, ProductPage,
    ProductQuery, ReviewInput,
};
use super::{ApiClient, ApiError, segment};

impl ApiClient {
    /// List products matching the shop filters.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn products(&self, query: &ProductQuery) -> Result<ProductPage, ApiError> {
        let mut url = self.endpoint("products")?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(category) = &query.category {
                pairs.append_pair("category", category.as_str());
            }
            if let Some(search) = &query.search {
                pairs.append_pair("search", search);
            }
            if let Some(sort) = query.sort {
                pairs.append_pair("sort", sort.as_str());
            }
            if let Some(page) = query.page {
                pairs.append_pair("page", &page.to_string());
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }

        let response: ProductListResponse =
            self.send(self.request(Method::GET, url, None)).await?;
        Ok(response.into())
    }

    /// Latest products for the home page.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn recent_products(&self) -> Result<Vec<Product>, ApiError> {
        if let Some(CacheValue::Products(products)) =
            self.inner.cache.get(&CacheKey::RecentProducts).await
        {
            debug!("Cache hit for recent products");
            return Ok(products);
        }

        let products: Vec<Product> = self.get("products/recent", None).await?;
        self.inner
            .cache
            .insert(CacheKey::RecentProducts, CacheValue::Products(products.clone()))
            .await;
        Ok(products)
    }

    /// Get a product with its category populated.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the product doesn't exist.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let key = CacheKey::Product(id.clone());
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let product: Product = self
            .get(&format!("products/{}", segment(id)), None)
            .await?;
        self.inner
            .cache
            .insert(key, CacheValue::Product(Box::new(product.clone())))
            .await;
        Ok(product)
    }

    /// Post a review for a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the review (e.g. already reviewed).
    #[instrument(skip(self, token, comment), fields(product_id = %id))]
    pub async fn add_review(
        &self,
        token: &ApiToken,
        id: &ProductId,
        rating: u8,
        comment: &str,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("products/{}/reviews", segment(id)))?;
        self.send_ignored(
            self.request(Method::POST, url, Some(token))
                .json(&ReviewInput { rating, comment }),
        )
        .await?;
        self.invalidate_product(id).await;
        Ok(())
    }

    /// All categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            return Ok(categories);
        }

        let categories: Vec<Category> = self.get("categories", None).await?;
        self.inner
            .cache
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(categories.clone()),
            )
            .await;
        Ok(categories)
    }

    /// All brands.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn brands(&self) -> Result<Vec<Brand>, ApiError> {
        if let Some(CacheValue::Brands(brands)) = self.inner.cache.get(&CacheKey::Brands).await {
            return Ok(brands);
        }

        let brands: Vec<Brand> = self.get("brands", None).await?;
        self.inner
            .cache
            .insert(CacheKey::Brands, CacheValue::Brands(brands.clone()))
            .await;
        Ok(brands)
    }

    // =========================================================================
    // Admin
    // =========================================================================

    /// Create a category (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the name.
    #[instrument(skip(self, token))]
    pub async fn create_category(&self, token: &ApiToken, name: &str) -> Result<Category, ApiError> {
        let category = self
            .post("categories", Some(token), &NameInput { name })
            .await?;
        self.inner.cache.invalidate(&CacheKey::Categories).await;
        Ok(category)
    }

    /// Create a brand (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the name.
    #[instrument(skip(self, token))]
    pub async fn create_brand(&self, token: &ApiToken, name: &str) -> Result<Brand, ApiError> {
        let brand = self.post("brands", Some(token), &NameInput { name }).await?;
        self.inner.cache.invalidate(&CacheKey::Brands).await;
        Ok(brand)
    }

    /// Create a product (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the product.
    #[instrument(skip(self, token, input), fields(name = %input.name))]
    pub async fn create_product(
        &self,
        token: &ApiToken,
        input: &ProductInput,
    ) -> Result<Product, ApiError> {
        let product = self.post("products", Some(token), input).await?;
        self.inner.cache.invalidate(&CacheKey::RecentProducts).await;
        Ok(product)
    }

    /// Update a product (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the update.
    #[instrument(skip(self, token, input), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        token: &ApiToken,
        id: &ProductId,
        input: &ProductInput,
    ) -> Result<Product, ApiError> {
        let product = self
            .put(&format!("products/{}", segment(id)), Some(token), input)
            .await?;
        self.invalidate_product(id).await;
        Ok(product)
    }

    /// Delete a product (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn delete_product(&self, token: &ApiToken, id: &ProductId) -> Result<(), ApiError> {
        self.delete(&format!("products/{}", segment(id)), token)
            .await?;
        self.invalidate_product(id).await;
        Ok(())
    }

    pub(super) async fn invalidate_product(&self, id: &ProductId) {
        self.inner
            .cache
            .invalidate(&CacheKey::Product(id.clone()))
            .await;
        self.inner.cache.invalidate(&CacheKey::RecentProducts).await;
    }
}
