//! Cache types for catalog reads.

use bestdeal_core::ProductId;

use super::types::{Banner, Brand, Category, Product};

/// Cache key for catalog responses.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(ProductId),
    RecentProducts,
    Categories,
    Brands,
    Banners,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(Vec<Product>),
    Categories(Vec<Category>),
    Brands(Vec<Brand>),
    Banners(Vec<Banner>),
}
