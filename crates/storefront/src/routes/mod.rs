//! HTTP route handlers for the storefront.
//!
//! Public paths are Spanish, matching the links customers already have.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                              - Home: banners and recent products
//!
//! # Catalog
//! GET  /tienda                        - Product listing (category, search, sort, page)
//! GET  /producto/{id}                 - Product detail with reviews
//! POST /producto/{id}/resenas         - Add a review (auth)
//!
//! # Cart
//! GET  /carrito                       - Cart page
//! POST /carrito/agregar               - Add a product (merges by product)
//! POST /carrito/{id}/aumentar         - One more unit
//! POST /carrito/{id}/disminuir        - One less unit (never below one)
//! POST /carrito/{id}/eliminar         - Remove the line
//!
//! # Checkout (auth)
//! GET  /carrito/pagar                 - Entry point, redirects to the next step
//! GET  /envio, POST /envio            - Shipping address
//! GET  /pago, POST /pago              - Payment method
//! GET  /realizar-pedido               - Review
//! POST /realizar-pedido               - Place the order
//!
//! # Account (auth)
//! GET  /perfil                        - Profile, orders and tickets
//! GET  /pedido/{id}                   - Order detail
//!
//! # Support (auth)
//! GET  /soporte/nuevo                 - New ticket form (?pedido=)
//! POST /soporte                       - Create ticket
//! GET  /soporte/{id}                  - Ticket thread
//! POST /soporte/{id}/responder        - Reply
//! POST /soporte/{id}/estado           - Change status (admin)
//!
//! # Auth
//! GET  /login, POST /login            - Login (?redirect=)
//! GET  /registro, POST /registro      - Register
//! POST /logout                        - Logout
//!
//! # Pages
//! GET  /sobre-nosotros                - About
//! GET  /contacto, POST /contacto      - Contact form
//!
//! # Admin
//! /admin/...                          - See `admin::routes`
//! ```

pub mod account;
pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod home;
pub mod pages;
pub mod products;
pub mod support;

use axum::{
    Router,
    routing::{get, post},
};
use tower_sessions::Session;

use crate::api::ApiError;
use crate::error::AppError;
use crate::middleware::{auth_rate_limiter, form_rate_limiter};
use crate::models::Flash;
use crate::state::AppState;

/// Create the catalog routes router.
fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/tienda", get(products::index))
        .route("/producto/{id}", get(products::show))
        .route(
            "/producto/{id}/resenas",
            post(products::add_review).layer(form_rate_limiter()),
        )
}

/// Create the cart routes router.
fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/agregar", post(cart::add))
        .route("/pagar", get(checkout::start))
        .route("/{id}/aumentar", post(cart::increase))
        .route("/{id}/disminuir", post(cart::decrease))
        .route("/{id}/eliminar", post(cart::remove))
}

/// Create the checkout step routes router.
fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/envio", get(checkout::shipping_page).post(checkout::save_shipping))
        .route("/pago", get(checkout::payment_page).post(checkout::save_payment))
        .route(
            "/realizar-pedido",
            get(checkout::review_page).merge(post(checkout::place_order).layer(form_rate_limiter())),
        )
}

/// Create the account and support routes router.
fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/perfil", get(account::profile))
        .route("/pedido/{id}", get(account::order))
        .route("/soporte/nuevo", get(support::new_ticket_page))
        .route(
            "/soporte",
            post(support::create_ticket).layer(form_rate_limiter()),
        )
        .route("/soporte/{id}", get(support::show))
        .route("/soporte/{id}/responder", post(support::reply))
        .route("/soporte/{id}/estado", post(support::set_status))
}

/// Create the auth routes router.
///
/// Login and registration share one rate limit bucket per client.
fn auth_routes() -> Router<AppState> {
    let limiter = auth_rate_limiter();

    Router::new()
        .route(
            "/login",
            get(auth::login_page).merge(post(auth::login).layer(limiter.clone())),
        )
        .route(
            "/registro",
            get(auth::register_page).merge(post(auth::register).layer(limiter)),
        )
        .route("/logout", post(auth::logout))
}

/// Create the static page routes router.
fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/sobre-nosotros", get(pages::about))
        .route(
            "/contacto",
            get(pages::contact_page).merge(post(pages::contact).layer(form_rate_limiter())),
        )
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .merge(catalog_routes())
        .nest("/carrito", cart_routes())
        .merge(checkout_routes())
        .merge(account_routes())
        .merge(auth_routes())
        .merge(page_routes())
        .nest("/admin", admin::routes())
}

// =============================================================================
// Shared handler helpers
// =============================================================================

/// Report a failed API call to the visitor as a flash message.
///
/// An expired token is not recoverable here and propagates so the error
/// response logs the visitor out.
pub(crate) async fn flash_api_error(session: &Session, err: ApiError) -> Result<(), AppError> {
    if matches!(err, ApiError::Unauthorized(_)) {
        return Err(err.into());
    }
    if err.is_client_error() {
        tracing::info!(error = %err, "API rejected request");
    } else {
        tracing::error!(error = %err, "API request failed");
    }
    Flash::error(session, err.user_message()).await;
    Ok(())
}

/// Only same-site paths are accepted as post-login destinations.
pub(crate) fn safe_redirect(target: Option<&str>) -> &str {
    match target.map(str::trim) {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.contains('\\')
                && !path.chars().any(char::is_control)
                && !path.starts_with("/login") =>
        {
            path
        }
        _ => "/",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_redirect() {
        assert_eq!(safe_redirect(Some("/envio")), "/envio");
        assert_eq!(safe_redirect(Some("/soporte/nuevo?pedido=o1")), "/soporte/nuevo?pedido=o1");
        assert_eq!(safe_redirect(Some("https://evil.example")), "/");
        assert_eq!(safe_redirect(Some("//evil.example")), "/");
        assert_eq!(safe_redirect(Some("/\\evil.example")), "/");
        assert_eq!(safe_redirect(Some("/\t/evil.example")), "/");
        assert_eq!(safe_redirect(Some("/\r\n/evil.example")), "/");
        assert_eq!(safe_redirect(Some("/%09/evil.example")), "/%09/evil.example");
        assert_eq!(safe_redirect(Some("/login?redirect=%2F")), "/");
        assert_eq!(safe_redirect(None), "/");
    }
}
