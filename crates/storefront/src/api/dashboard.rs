//! Admin dashboard counters.

use bestdeal_core::ApiToken;
use tracing::instrument;

use super::types::Summary;
use super::{ApiClient, ApiError};

impl ApiClient {
    /// Store-wide counters (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn summary(&self, token: &ApiToken) -> Result<Summary, ApiError> {
        self.get("summary", Some(token)).await
    }

    /// Readiness probe: the API answers a cheap catalog read.
    ///
    /// # Errors
    ///
    /// Returns an error if the API is unreachable or failing.
    pub async fn ping(&self) -> Result<(), ApiError> {
        let url = self.endpoint("categories")?;
        self.send_ignored(self.request(reqwest::Method::GET, url, None))
            .await
    }
}
