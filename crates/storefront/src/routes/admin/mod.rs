//! Admin back-office route handlers.
//!
//! Every handler takes [`RequireAdmin`](crate::middleware::RequireAdmin);
//! the backend enforces the same role on its side.
//!
//! # Route Structure
//!
//! ```text
//! GET  /admin                          - Dashboard counters
//! GET  /admin/productos                - Product list (?pagina=&buscar=)
//! GET  /admin/productos/nuevo          - New product form
//! POST /admin/productos                - Create product (multipart)
//! GET  /admin/productos/editar/{id}    - Edit product form
//! POST /admin/productos/{id}           - Update product (multipart)
//! POST /admin/productos/{id}/eliminar  - Delete product
//! POST /admin/categorias               - Create category
//! POST /admin/marcas                   - Create brand
//! GET  /admin/pedidos                  - All orders
//! POST /admin/pedidos/{id}/entregar    - Mark delivered
//! GET  /admin/usuarios                 - All users
//! POST /admin/usuarios/{id}/eliminar   - Delete user
//! GET  /admin/tickets                  - All tickets
//! GET  /admin/tickets/{id}             - Ticket thread with status controls
//! GET  /admin/banners                  - Banners
//! POST /admin/banners                  - Add banner (multipart)
//! POST /admin/banners/{id}/subir       - Move up
//! POST /admin/banners/{id}/bajar       - Move down
//! POST /admin/banners/{id}/eliminar    - Delete banner
//! ```

pub mod banners;
pub mod dashboard;
pub mod form;
pub mod orders;
pub mod products;
pub mod tickets;
pub mod users;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::state::AppState;

use super::support;

/// Largest admin upload accepted (product and banner images).
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Create the admin routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::index))
        .route("/productos", get(products::index).post(products::create))
        .route("/productos/nuevo", get(products::new_page))
        .route("/productos/editar/{id}", get(products::edit_page))
        .route("/productos/{id}", post(products::update))
        .route("/productos/{id}/eliminar", post(products::delete))
        .route("/categorias", post(products::create_category))
        .route("/marcas", post(products::create_brand))
        .route("/pedidos", get(orders::index))
        .route("/pedidos/{id}/entregar", post(orders::mark_delivered))
        .route("/usuarios", get(users::index))
        .route("/usuarios/{id}/eliminar", post(users::delete))
        .route("/tickets", get(tickets::index))
        .route("/tickets/{id}", get(support::show))
        .route("/banners", get(banners::index).post(banners::create))
        .route("/banners/{id}/subir", post(banners::move_up))
        .route("/banners/{id}/bajar", post(banners::move_down))
        .route("/banners/{id}/eliminar", post(banners::delete))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}
