//! Admin order management.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use bestdeal_core::OrderId;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::models::Flash;
use crate::state::AppState;
use crate::views::{OrderRow, PageContext};

use super::super::{flash_api_error, safe_redirect};

/// Order list template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/orders.html")]
pub struct OrderListTemplate {
    pub page: PageContext,
    pub orders: Vec<OrderRow>,
}

/// List every order, newest first as the backend sends them.
#[instrument(skip(state, session, auth))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(auth): RequireAdmin,
) -> Result<Response> {
    let orders = state.api().all_orders(&auth.token).await?;

    Ok(OrderListTemplate {
        page: PageContext::load(&session).await,
        orders: orders.iter().map(OrderRow::from).collect(),
    }
    .into_response())
}

#[derive(Debug, Default, Deserialize)]
pub struct DeliverForm {
    #[serde(default)]
    pub return_to: Option<String>,
}

/// Mark an order as delivered, then go back to the page the button was on.
#[instrument(skip(state, session, auth, form), fields(order_id = %id))]
pub async fn mark_delivered(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(auth): RequireAdmin,
    Path(id): Path<OrderId>,
    Form(form): Form<DeliverForm>,
) -> Result<Response> {
    match state.api().mark_delivered(&auth.token, &id).await {
        Ok(()) => {
            tracing::info!("Order marked delivered");
            Flash::success(&session, "Pedido marcado como entregado.").await;
        }
        Err(e) => flash_api_error(&session, e).await?,
    }

    let back = match form.return_to.as_deref() {
        Some(target) => safe_redirect(Some(target)),
        None => "/admin/pedidos",
    };
    Ok(Redirect::to(back).into_response())
}
