//! Admin ticket list. Threads are served by the support handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use bestdeal_core::TicketStatus;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::state::AppState;
use crate::views::{PageContext, TicketRow};

#[derive(Debug, Default, Deserialize)]
pub struct TicketFilter {
    pub estado: Option<String>,
}

#[derive(Clone)]
pub struct FilterLink {
    pub label: &'static str,
    pub url: String,
    pub active: bool,
}

/// Ticket list template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/tickets.html")]
pub struct TicketListTemplate {
    pub page: PageContext,
    pub tickets: Vec<TicketRow>,
    pub status_links: Vec<FilterLink>,
}

fn filter_links(active: Option<TicketStatus>) -> Vec<FilterLink> {
    let mut links = vec![FilterLink {
        label: "Todos",
        url: "/admin/tickets".to_string(),
        active: active.is_none(),
    }];
    links.extend(TicketStatus::ALL.into_iter().map(|status| FilterLink {
        label: status.label(),
        url: format!(
            "/admin/tickets?estado={}",
            urlencoding::encode(status.label())
        ),
        active: active == Some(status),
    }));
    links
}

/// List every ticket, optionally filtered by status.
#[instrument(skip(state, session, auth))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(auth): RequireAdmin,
    Query(filter): Query<TicketFilter>,
) -> Result<Response> {
    let status = filter
        .estado
        .as_deref()
        .and_then(|s| s.parse::<TicketStatus>().ok());
    let tickets = state.api().all_tickets(&auth.token).await?;

    Ok(TicketListTemplate {
        page: PageContext::load(&session).await,
        tickets: tickets
            .iter()
            .filter(|ticket| status.is_none_or(|status| ticket.status == status))
            .map(TicketRow::from)
            .collect(),
        status_links: filter_links(status),
    }
    .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_links_mark_active_status() {
        let links = filter_links(Some(TicketStatus::EnProceso));
        assert_eq!(links.len(), TicketStatus::ALL.len() + 1);
        assert!(!links[0].active);
        let active: Vec<_> = links.iter().filter(|l| l.active).collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].label, TicketStatus::EnProceso.label());
        assert!(active[0].url.starts_with("/admin/tickets?estado="));
    }
}
