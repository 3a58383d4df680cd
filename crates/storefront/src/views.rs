//! Display data shared by templates.
//!
//! Templates receive pre-formatted strings; conversion from API and store
//! types happens here so the templates stay free of logic.

use chrono::{DateTime, Utc};
use tower_sessions::Session;

use bestdeal_core::{Cart, CartItem, OrderStatus, TicketStatus};

use crate::api::{Order, Product, Ticket};
use crate::models::Flash;
use crate::models::session::{current_auth, load_cart};

/// Image shown for products and items without one.
pub const PLACEHOLDER_IMAGE: &str = "/static/img/placeholder.svg";

/// `18/10/2026`, or an empty string when the backend sent no date.
#[must_use]
pub fn format_date(date: Option<DateTime<Utc>>) -> String {
    date.map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_default()
}

fn image_or_placeholder(image: Option<&str>) -> String {
    image
        .filter(|url| !url.trim().is_empty())
        .unwrap_or(PLACEHOLDER_IMAGE)
        .to_string()
}

// =============================================================================
// Layout
// =============================================================================

/// Data every page layout needs: who is signed in, the cart badge, and the
/// flash messages queued for this render.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub signed_in: bool,
    pub user_name: String,
    pub is_admin: bool,
    pub cart_count: u32,
    pub flashes: Vec<Flash>,
}

impl PageContext {
    /// Load the layout data and drain pending flashes.
    ///
    /// Call this only when a page is about to render; a handler that
    /// redirects should leave the flashes for the next page.
    pub async fn load(session: &Session) -> Self {
        let auth = current_auth(session).await;
        let cart_count = match load_cart(session).await {
            Ok(cart) => cart.item_count(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load cart for layout");
                0
            }
        };

        Self {
            signed_in: auth.is_some(),
            user_name: auth
                .as_ref()
                .map(|auth| auth.user.first_name().to_string())
                .unwrap_or_default(),
            is_admin: auth.as_ref().is_some_and(|auth| auth.is_admin()),
            cart_count,
            flashes: Flash::drain(session).await,
        }
    }
}

// =============================================================================
// Catalog
// =============================================================================

#[derive(Debug, Clone)]
pub struct ProductCard {
    pub id: String,
    pub name: String,
    pub brand: String,
    pub category: String,
    pub price: String,
    pub image: String,
    pub rating: f64,
    pub num_reviews: u32,
    pub in_stock: bool,
}

impl From<&Product> for ProductCard {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            brand: product.brand.clone().unwrap_or_default(),
            category: product.category_name().unwrap_or_default().to_string(),
            price: product.price.display(),
            image: image_or_placeholder(product.image.as_deref()),
            rating: product.rating.unwrap_or(0.0),
            num_reviews: product
                .num_reviews
                .unwrap_or_else(|| u32::try_from(product.reviews.len()).unwrap_or(u32::MAX)),
            in_stock: product.is_in_stock(),
        }
    }
}

// =============================================================================
// Cart
// =============================================================================

#[derive(Debug, Clone)]
pub struct CartLineView {
    pub id: String,
    pub name: String,
    pub brand: String,
    pub image: String,
    pub price: String,
    pub quantity: u32,
    pub line_total: String,
    pub can_decrease: bool,
    pub can_increase: bool,
}

impl From<&CartItem> for CartLineView {
    fn from(item: &CartItem) -> Self {
        Self {
            id: item.product.to_string(),
            name: item.name.clone(),
            brand: item.brand.clone().unwrap_or_default(),
            image: image_or_placeholder(item.image.as_deref()),
            price: item.price.display(),
            quantity: item.quantity,
            line_total: item.line_total().display(),
            can_decrease: item.quantity > 1,
            can_increase: item.stock.is_none_or(|stock| item.quantity < stock),
        }
    }
}

/// Cart lines with the computed totals.
#[derive(Debug, Clone)]
pub struct CartView {
    pub items: Vec<CartLineView>,
    pub item_count: u32,
    pub items_price: String,
    pub shipping_price: String,
    pub tax_price: String,
    pub total_price: String,
    pub free_shipping: bool,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        let totals = cart.totals();
        Self {
            items: cart.items().iter().map(CartLineView::from).collect(),
            item_count: cart.item_count(),
            items_price: totals.items_price.display(),
            shipping_price: totals.shipping_price.display(),
            tax_price: totals.tax_price.display(),
            total_price: totals.total_price.display(),
            free_shipping: totals.shipping_price.is_zero(),
        }
    }
}

// =============================================================================
// Orders and tickets
// =============================================================================

#[must_use]
pub const fn order_status_class(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pendiente => "badge--pending",
        OrderStatus::Enviado => "badge--info",
        OrderStatus::Entregado => "badge--success",
        OrderStatus::Cancelado => "badge--danger",
    }
}

#[must_use]
pub const fn ticket_status_class(status: TicketStatus) -> &'static str {
    match status {
        TicketStatus::Abierto => "badge--pending",
        TicketStatus::EnProceso => "badge--info",
        TicketStatus::Cerrado => "badge--muted",
    }
}

/// One row of an order list.
#[derive(Debug, Clone)]
pub struct OrderRow {
    pub id: String,
    pub number: String,
    pub date: String,
    pub customer: String,
    pub item_count: u32,
    pub total: String,
    pub status: &'static str,
    pub status_class: &'static str,
    pub is_delivered: bool,
}

impl From<&Order> for OrderRow {
    fn from(order: &Order) -> Self {
        let status = order.status();
        Self {
            id: order.id.to_string(),
            number: order.number_label(),
            date: format_date(order.created_at),
            customer: order
                .customer()
                .map(|customer| customer.name.clone())
                .unwrap_or_default(),
            item_count: order.order_items.iter().map(|item| item.quantity).sum(),
            total: order.total_price.display(),
            status: status.label(),
            status_class: order_status_class(status),
            is_delivered: order.is_delivered,
        }
    }
}

/// One row of a ticket list.
#[derive(Debug, Clone)]
pub struct TicketRow {
    pub id: String,
    pub subject: String,
    pub author: String,
    pub order_label: String,
    pub date: String,
    pub message_count: usize,
    pub status: &'static str,
    pub status_class: &'static str,
}

impl From<&Ticket> for TicketRow {
    fn from(ticket: &Ticket) -> Self {
        Self {
            id: ticket.id.to_string(),
            subject: ticket.subject.clone(),
            author: ticket
                .author()
                .map(|author| author.name.clone())
                .unwrap_or_default(),
            order_label: ticket.order_label().unwrap_or_default(),
            date: format_date(ticket.created_at),
            message_count: ticket.messages.len(),
            status: ticket.status.label(),
            status_class: ticket_status_class(ticket.status),
        }
    }
}
