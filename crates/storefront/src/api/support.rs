//! Support tickets.

use bestdeal_core::{ApiToken, OrderId, TicketId, TicketStatus};
use tracing::instrument;

use super::types::{NewTicket, Ticket, TicketReply, TicketStatusInput};
use super::{ApiClient, ApiError, segment};

impl ApiClient {
    /// Open a ticket, optionally about one of the user's orders.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the ticket.
    #[instrument(skip(self, token, message))]
    pub async fn create_ticket(
        &self,
        token: &ApiToken,
        subject: &str,
        message: &str,
        order: Option<&OrderId>,
    ) -> Result<Ticket, ApiError> {
        self.post(
            "tickets",
            Some(token),
            &NewTicket {
                subject,
                message,
                order,
            },
        )
        .await
    }

    /// Tickets opened by the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn my_tickets(&self, token: &ApiToken) -> Result<Vec<Ticket>, ApiError> {
        self.get("tickets/mytickets", Some(token)).await
    }

    /// Every ticket (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn all_tickets(&self, token: &ApiToken) -> Result<Vec<Ticket>, ApiError> {
        self.get("tickets", Some(token)).await
    }

    /// Ticket with its message thread.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the ticket doesn't exist.
    #[instrument(skip(self, token), fields(ticket_id = %id))]
    pub async fn ticket(&self, token: &ApiToken, id: &TicketId) -> Result<Ticket, ApiError> {
        self.get(&format!("tickets/{}", segment(id)), Some(token))
            .await
    }

    /// Append a reply to the thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the reply (e.g. ticket closed).
    #[instrument(skip(self, token, message), fields(ticket_id = %id))]
    pub async fn reply_ticket(
        &self,
        token: &ApiToken,
        id: &TicketId,
        message: &str,
    ) -> Result<Ticket, ApiError> {
        self.post(
            &format!("tickets/{}/reply", segment(id)),
            Some(token),
            &TicketReply { message },
        )
        .await
    }

    /// Change a ticket's status (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the change.
    #[instrument(skip(self, token), fields(ticket_id = %id))]
    pub async fn set_ticket_status(
        &self,
        token: &ApiToken,
        id: &TicketId,
        status: TicketStatus,
    ) -> Result<Ticket, ApiError> {
        self.put(
            &format!("tickets/{}/status", segment(id)),
            Some(token),
            &TicketStatusInput { status },
        )
        .await
    }
}
