//! BestDeal Core - Shared domain types.
//!
//! This crate holds everything the storefront keeps per visitor, plus the
//! typed wrappers used to talk about entities owned by the backend API:
//! - `storefront` - Server-rendered shop and admin back-office
//! - `cli` - Session store maintenance
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP clients. Cart and auth state are plain values; the
//! storefront decides where they are persisted.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, money, emails and statuses
//! - [`cart`] - The cart store (line items, shipping address, payment method)
//! - [`auth`] - The auth store (session user and bearer token)
//! - [`checkout`] - Checkout step gating
//! - [`pagination`] - Page window arithmetic for listings

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod pagination;
pub mod types;

pub use auth::{ApiToken, AuthSession, LoginResponse, SessionUser};
pub use cart::{
    Cart, CartError, CartItem, CartProduct, CartTotals, MAX_LINE_QUANTITY, ShippingAddress,
};
pub use checkout::{CheckoutBlock, CheckoutProgress, CheckoutStep};
pub use pagination::Pagination;
pub use types::*;
