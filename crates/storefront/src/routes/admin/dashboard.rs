//! Admin dashboard.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use bestdeal_core::{OrderStatus, TicketStatus};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::state::AppState;
use crate::views::{PageContext, order_status_class, ticket_status_class};

#[derive(Clone)]
pub struct StatusCount {
    pub label: &'static str,
    pub class: &'static str,
    pub count: u64,
}

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub page: PageContext,
    pub revenue: String,
    pub active_orders: u64,
    pub users: u64,
    pub products: u64,
    pub tickets: u64,
    pub order_statuses: Vec<StatusCount>,
    pub ticket_statuses: Vec<StatusCount>,
}

/// Display the store counters.
#[instrument(skip(state, session, auth))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(auth): RequireAdmin,
) -> Result<Response> {
    let summary = state.api().summary(&auth.token).await?;

    Ok(DashboardTemplate {
        page: PageContext::load(&session).await,
        revenue: summary.total_revenue.display_cop(),
        active_orders: summary.total_active_orders,
        users: summary.total_users,
        products: summary.total_products,
        tickets: summary.total_tickets,
        order_statuses: OrderStatus::ALL
            .into_iter()
            .map(|status| StatusCount {
                label: status.label(),
                class: order_status_class(status),
                count: summary.order_status_counts.get(status.label()),
            })
            .collect(),
        ticket_statuses: TicketStatus::ALL
            .into_iter()
            .map(|status| StatusCount {
                label: status.label(),
                class: ticket_status_class(status),
                count: summary.ticket_status_counts.get(status.label()),
            })
            .collect(),
    }
    .into_response())
}
