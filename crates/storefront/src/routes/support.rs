//! Support ticket route handlers.
//!
//! Customers open tickets (optionally about one of their orders) and reply
//! in a thread. Admins see the same thread with status controls.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use bestdeal_core::{OrderId, TicketId, TicketStatus};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::Flash;
use crate::state::AppState;
use crate::views::{PageContext, TicketRow, format_date};

use super::flash_api_error;

fn ticket_path(id: &TicketId) -> String {
    format!("/soporte/{}", urlencoding::encode(id.as_str()))
}

// =============================================================================
// New ticket
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct NewTicketQuery {
    pub pedido: Option<String>,
}

#[derive(Clone)]
pub struct OrderChoice {
    pub id: String,
    pub label: String,
    pub selected: bool,
}

/// New ticket form template.
#[derive(Template, WebTemplate)]
#[template(path = "support/new.html")]
pub struct NewTicketTemplate {
    pub page: PageContext,
    pub orders: Vec<OrderChoice>,
}

/// Display the new ticket form, optionally preselecting an order.
#[instrument(skip(state, session, auth))]
pub async fn new_ticket_page(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
    Query(query): Query<NewTicketQuery>,
) -> Result<Response> {
    let orders = match state.api().my_orders(&auth.token).await {
        Ok(orders) => orders,
        Err(e @ crate::api::ApiError::Unauthorized(_)) => return Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load orders for ticket form");
            Vec::new()
        }
    };
    let preselected = query.pedido.as_deref().map(str::trim).unwrap_or_default();

    Ok(NewTicketTemplate {
        page: PageContext::load(&session).await,
        orders: orders
            .iter()
            .map(|order| OrderChoice {
                id: order.id.to_string(),
                label: format!(
                    "{} ({}, {})",
                    order.number_label(),
                    format_date(order.created_at),
                    order.total_price
                ),
                selected: order.id.as_str() == preselected,
            })
            .collect(),
    }
    .into_response())
}

#[derive(Debug, Deserialize)]
pub struct NewTicketForm {
    pub subject: String,
    pub message: String,
    #[serde(default)]
    pub order: Option<String>,
}

/// Open a ticket and show its thread.
#[instrument(skip(state, session, auth, form))]
pub async fn create_ticket(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
    Form(form): Form<NewTicketForm>,
) -> Result<Response> {
    let subject = form.subject.trim();
    let message = form.message.trim();
    if subject.is_empty() || message.is_empty() {
        Flash::error(&session, "Escribe un asunto y un mensaje.").await;
        return Ok(Redirect::to("/soporte/nuevo").into_response());
    }
    let order = form
        .order
        .as_deref()
        .and_then(|id| OrderId::parse(id).ok());

    match state
        .api()
        .create_ticket(&auth.token, subject, message, order.as_ref())
        .await
    {
        Ok(ticket) => {
            tracing::info!(ticket_id = %ticket.id, "Ticket created");
            Flash::success(&session, "Recibimos tu solicitud, te responderemos pronto.").await;
            Ok(Redirect::to(&ticket_path(&ticket.id)).into_response())
        }
        Err(e) => {
            flash_api_error(&session, e).await?;
            Ok(Redirect::to("/soporte/nuevo").into_response())
        }
    }
}

// =============================================================================
// Thread
// =============================================================================

#[derive(Clone)]
pub struct MessageView {
    pub author: String,
    pub text: String,
    pub date: String,
    pub from_staff: bool,
}

#[derive(Clone)]
pub struct StatusChoice {
    pub value: &'static str,
}

/// Ticket thread template.
#[derive(Template, WebTemplate)]
#[template(path = "support/show.html")]
pub struct TicketTemplate {
    pub page: PageContext,
    pub ticket: TicketRow,
    pub order_id: Option<String>,
    pub messages: Vec<MessageView>,
    pub can_reply: bool,
    pub status_choices: Vec<StatusChoice>,
}

/// Display a ticket thread.
///
/// Served at `/soporte/{id}` and `/admin/tickets/{id}`; admins get the
/// status controls.
#[instrument(skip(state, session, auth), fields(ticket_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<TicketId>,
) -> Result<Response> {
    let ticket = state.api().ticket(&auth.token, &id).await?;

    let status_choices = if auth.is_admin() {
        ticket
            .status
            .admin_transitions()
            .into_iter()
            .map(|status| StatusChoice {
                value: status.label(),
            })
            .collect()
    } else {
        Vec::new()
    };

    Ok(TicketTemplate {
        page: PageContext::load(&session).await,
        order_id: ticket.order_id().map(ToString::to_string),
        messages: ticket
            .messages
            .iter()
            .map(|message| MessageView {
                author: if message.name.is_empty() {
                    if message.is_from_staff() { "Soporte" } else { "Cliente" }.to_string()
                } else {
                    message.name.clone()
                },
                text: message.text.clone(),
                date: format_date(message.created_at),
                from_staff: message.is_from_staff(),
            })
            .collect(),
        can_reply: !ticket.status.is_closed(),
        status_choices,
        ticket: TicketRow::from(&ticket),
    }
    .into_response())
}

#[derive(Debug, Deserialize)]
pub struct ReplyForm {
    pub message: String,
}

/// Reply in a ticket thread.
#[instrument(skip(state, session, auth, form), fields(ticket_id = %id))]
pub async fn reply(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<TicketId>,
    Form(form): Form<ReplyForm>,
) -> Result<Response> {
    let message = form.message.trim();
    if message.is_empty() {
        Flash::error(&session, "Escribe un mensaje.").await;
    } else {
        match state.api().reply_ticket(&auth.token, &id, message).await {
            Ok(_) => Flash::success(&session, "Mensaje enviado.").await,
            Err(e) => flash_api_error(&session, e).await?,
        }
    }
    Ok(Redirect::to(&ticket_path(&id)).into_response())
}

#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

/// Move a ticket to another status (admin).
///
/// Only forward transitions are allowed; closed tickets stay closed.
#[instrument(skip(state, session, auth), fields(ticket_id = %id))]
pub async fn set_status(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(auth): RequireAdmin,
    Path(id): Path<TicketId>,
    Form(form): Form<StatusForm>,
) -> Result<Response> {
    let back = ticket_path(&id);
    let Ok(next) = form.status.parse::<TicketStatus>() else {
        Flash::error(&session, "Estado no válido.").await;
        return Ok(Redirect::to(&back).into_response());
    };

    let ticket = state.api().ticket(&auth.token, &id).await?;
    if !ticket.status.can_transition_to(next) {
        Flash::error(
            &session,
            format!("No se puede pasar de {} a {next}.", ticket.status),
        )
        .await;
        return Ok(Redirect::to(&back).into_response());
    }

    match state.api().set_ticket_status(&auth.token, &id, next).await {
        Ok(_) => {
            tracing::info!(status = %next, "Ticket status changed");
            Flash::success(&session, format!("Ticket marcado como {next}.")).await;
        }
        Err(e) => flash_api_error(&session, e).await?,
    }
    Ok(Redirect::to(&back).into_response())
}
