//! The auth store.
//!
//! Holds the identity of the signed-in user together with the bearer token
//! the backend issued at login. The storefront keeps one [`AuthSession`] per
//! visitor in its session store; logging out drops it.

use core::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::types::{UserId, UserRole};

/// Bearer token for authenticated backend calls.
///
/// Redacted in `Debug` output. It is serialized in clear only so it can be
/// written to the server-side session store.
#[derive(Clone)]
pub struct ApiToken(SecretString);

impl ApiToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    /// The raw token, for the `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiToken([REDACTED])")
    }
}

impl PartialEq for ApiToken {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl Eq for ApiToken {}

impl Serialize for ApiToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.expose())
    }
}

impl<'de> Deserialize<'de> for ApiToken {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

/// Body returned by `POST /users/login` and `POST /users/register`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: UserRole,
    pub token: ApiToken,
}

/// The user record kept in the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

impl SessionUser {
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// First word of the name, for the header greeting.
    #[must_use]
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }
}

/// A signed-in visitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub user: SessionUser,
    pub token: ApiToken,
}

impl AuthSession {
    /// Normalize a login or register response into the stored session.
    #[must_use]
    pub fn login(response: LoginResponse) -> Self {
        Self {
            user: SessionUser {
                id: response.id,
                name: response.name.trim().to_owned(),
                email: response.email.trim().to_lowercase(),
                role: response.role,
            },
            token: response.token,
        }
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.user.is_admin()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn response(role: &str) -> LoginResponse {
        serde_json::from_value(serde_json::json!({
            "_id": "665f1c",
            "name": " Ana María ",
            "email": "Ana@BestDeal.com",
            "role": role,
            "token": "jwt-abc",
        }))
        .unwrap()
    }

    #[test]
    fn test_login_normalizes_response() {
        let auth = AuthSession::login(response("user"));
        assert_eq!(auth.user.id.as_str(), "665f1c");
        assert_eq!(auth.user.name, "Ana María");
        assert_eq!(auth.user.first_name(), "Ana");
        assert_eq!(auth.user.email, "ana@bestdeal.com");
        assert!(!auth.is_admin());
        assert_eq!(auth.token.expose(), "jwt-abc");
    }

    #[test]
    fn test_admin_role() {
        assert!(AuthSession::login(response("admin")).is_admin());
    }

    #[test]
    fn test_missing_role_defaults_to_user() {
        let response: LoginResponse = serde_json::from_value(serde_json::json!({
            "_id": "1", "name": "x", "email": "x@y.co", "token": "t",
        }))
        .unwrap();
        assert_eq!(response.role, UserRole::User);
    }

    #[test]
    fn test_token_is_redacted_in_debug() {
        let auth = AuthSession::login(response("user"));
        let debug = format!("{auth:?}");
        assert!(!debug.contains("jwt-abc"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_session_round_trip_keeps_token() {
        let auth = AuthSession::login(response("admin"));
        let stored = serde_json::to_string(&auth).unwrap();
        let restored: AuthSession = serde_json::from_str(&stored).unwrap();
        assert_eq!(restored, auth);
        assert_eq!(restored.token.expose(), "jwt-abc");
    }
}
