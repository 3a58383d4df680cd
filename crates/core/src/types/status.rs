//! Status and role enums shared with the backend API.
//!
//! Serialized names match what the API stores (Spanish labels for order and
//! ticket states), so these enums deserialize API payloads directly.

use serde::{Deserialize, Serialize};

/// Role of a storefront user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    #[default]
    #[serde(other)]
    User,
}

impl UserRole {
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    #[default]
    Pendiente,
    Enviado,
    Entregado,
    Cancelado,
}

impl OrderStatus {
    pub const ALL: [Self; 4] = [
        Self::Pendiente,
        Self::Enviado,
        Self::Entregado,
        Self::Cancelado,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pendiente => "Pendiente",
            Self::Enviado => "Enviado",
            Self::Entregado => "Entregado",
            Self::Cancelado => "Cancelado",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Support ticket status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TicketStatus {
    #[default]
    Abierto,
    #[serde(rename = "En proceso")]
    EnProceso,
    Cerrado,
}

impl TicketStatus {
    pub const ALL: [Self; 3] = [Self::Abierto, Self::EnProceso, Self::Cerrado];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Abierto => "Abierto",
            Self::EnProceso => "En proceso",
            Self::Cerrado => "Cerrado",
        }
    }

    /// Closed tickets accept no replies and no further status changes.
    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Cerrado)
    }

    /// Statuses an admin may move the ticket to from its current status.
    #[must_use]
    pub fn admin_transitions(self) -> Vec<Self> {
        match self {
            Self::Abierto => vec![Self::EnProceso, Self::Cerrado],
            Self::EnProceso => vec![Self::Cerrado],
            Self::Cerrado => Vec::new(),
        }
    }

    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.admin_transitions().contains(&next)
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("invalid ticket status: {s}"))
    }
}

/// Payment method chosen during checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentMethod {
    #[default]
    PayPal,
    #[serde(rename = "Tarjeta de Crédito / Débito")]
    Card,
    #[serde(rename = "PSE")]
    Pse,
}

impl PaymentMethod {
    pub const ALL: [Self; 3] = [Self::PayPal, Self::Card, Self::Pse];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::PayPal => "PayPal",
            Self::Card => "Tarjeta de Crédito / Débito",
            Self::Pse => "PSE",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|method| method.label() == s.trim())
            .ok_or_else(|| format!("invalid payment method: {s}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_user_role_unknown_is_user() {
        let role: UserRole = serde_json::from_str("\"admin\"").unwrap();
        assert!(role.is_admin());
        let role: UserRole = serde_json::from_str("\"customer\"").unwrap();
        assert_eq!(role, UserRole::User);
    }

    #[test]
    fn test_ticket_status_wire_names() {
        let status: TicketStatus = serde_json::from_str("\"En proceso\"").unwrap();
        assert_eq!(status, TicketStatus::EnProceso);
        assert_eq!(
            serde_json::to_string(&TicketStatus::EnProceso).unwrap(),
            "\"En proceso\""
        );
        assert_eq!("cerrado".parse::<TicketStatus>(), Ok(TicketStatus::Cerrado));
    }

    #[test]
    fn test_ticket_transitions() {
        assert!(TicketStatus::Abierto.can_transition_to(TicketStatus::EnProceso));
        assert!(TicketStatus::Abierto.can_transition_to(TicketStatus::Cerrado));
        assert!(!TicketStatus::EnProceso.can_transition_to(TicketStatus::Abierto));
        assert!(TicketStatus::Cerrado.admin_transitions().is_empty());
    }

    #[test]
    fn test_payment_method_parse() {
        assert_eq!("PSE".parse::<PaymentMethod>(), Ok(PaymentMethod::Pse));
        assert_eq!(
            "Tarjeta de Crédito / Débito".parse::<PaymentMethod>(),
            Ok(PaymentMethod::Card)
        );
        assert!("Bitcoin".parse::<PaymentMethod>().is_err());
        assert_eq!(PaymentMethod::default(), PaymentMethod::PayPal);
    }
}
