//! Authentication and user administration.

use bestdeal_core::{ApiToken, LoginResponse, UserId};
use tracing::instrument;

use super::types::{LoginInput, RegisterInput, User};
use super::{ApiClient, ApiError, segment};

impl ApiClient {
    /// Exchange credentials for a session.
    ///
    /// # Errors
    ///
    /// Returns the API's rejection (wrong password, unknown email) as
    /// `ApiError::Unauthorized` or `ApiError::Api`.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        self.post("users/login", None, &LoginInput { email, password })
            .await
    }

    /// Create an account. The response is the same as a login.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the registration (e.g. email taken).
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<LoginResponse, ApiError> {
        self.post(
            "users/register",
            None,
            &RegisterInput {
                name,
                email,
                password,
            },
        )
        .await
    }

    /// Every user (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn users(&self, token: &ApiToken) -> Result<Vec<User>, ApiError> {
        self.get("users", Some(token)).await
    }

    /// Delete a user (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(user_id = %id))]
    pub async fn delete_user(&self, token: &ApiToken, id: &UserId) -> Result<(), ApiError> {
        self.delete(&format!("users/{}", segment(id)), token).await
    }
}
