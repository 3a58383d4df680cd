//! Account route handlers: profile and order detail.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use bestdeal_core::{OrderId, ShippingAddress};
use tower_sessions::Session;
use tracing::instrument;

use crate::api::Order;
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::state::AppState;
use crate::views::{OrderRow, PLACEHOLDER_IMAGE, PageContext, TicketRow, format_date};

/// Profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/profile.html")]
pub struct ProfileTemplate {
    pub page: PageContext,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
    pub orders: Vec<OrderRow>,
    pub tickets: Vec<TicketRow>,
}

/// Display the profile with the user's orders and tickets.
#[instrument(skip(state, session, auth), fields(user_id = %auth.user.id))]
pub async fn profile(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
) -> Result<Response> {
    let (orders, tickets) = tokio::join!(
        state.api().my_orders(&auth.token),
        state.api().my_tickets(&auth.token)
    );
    let orders = orders?;
    let tickets = tickets?;

    Ok(ProfileTemplate {
        page: PageContext::load(&session).await,
        name: auth.user.name.clone(),
        email: auth.user.email.clone(),
        is_admin: auth.is_admin(),
        orders: orders.iter().map(OrderRow::from).collect(),
        tickets: tickets.iter().map(TicketRow::from).collect(),
    }
    .into_response())
}

// =============================================================================
// Order detail
// =============================================================================

#[derive(Clone)]
pub struct OrderLineView {
    pub product_id: String,
    pub name: String,
    pub image: String,
    pub quantity: u32,
    pub price: String,
    pub line_total: String,
}

/// Order detail template.
#[derive(Template, WebTemplate)]
#[template(path = "account/order.html")]
pub struct OrderTemplate {
    pub page: PageContext,
    pub order: OrderRow,
    pub lines: Vec<OrderLineView>,
    pub address: ShippingAddress,
    pub payment_method: String,
    pub items_price: String,
    pub shipping_price: String,
    pub tax_price: String,
    pub paid: String,
    pub delivered: String,
    pub can_mark_delivered: bool,
}

fn order_lines(order: &Order) -> Vec<OrderLineView> {
    order
        .order_items
        .iter()
        .map(|item| OrderLineView {
            product_id: item.product.to_string(),
            name: item.name.clone(),
            image: item
                .image
                .clone()
                .filter(|url| !url.trim().is_empty())
                .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
            quantity: item.quantity,
            price: item.price.display(),
            line_total: item.line_total().display(),
        })
        .collect()
}

/// Display one order. The backend only returns orders the user may see.
#[instrument(skip(state, session, auth), fields(order_id = %id))]
pub async fn order(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Response> {
    let order = state.api().order(&auth.token, &id).await?;
    let items_price = order
        .items_price
        .unwrap_or_else(|| order.order_items.iter().map(|item| item.line_total()).sum());

    Ok(OrderTemplate {
        page: PageContext::load(&session).await,
        lines: order_lines(&order),
        address: order.shipping_address.clone().unwrap_or_default(),
        payment_method: order.payment_method.clone().unwrap_or_default(),
        items_price: items_price.display(),
        shipping_price: order.shipping_price.unwrap_or_default().display(),
        tax_price: order.tax_price.unwrap_or_default().display(),
        paid: if order.is_paid {
            format!("Pagado {}", format_date(order.paid_at))
        } else {
            "Pendiente de pago".to_string()
        },
        delivered: if order.is_delivered {
            format!("Entregado {}", format_date(order.delivered_at))
        } else {
            "No entregado".to_string()
        },
        can_mark_delivered: auth.is_admin() && !order.is_delivered,
        order: OrderRow::from(&order),
    }
    .into_response())
}
