//! Orders.

use bestdeal_core::{ApiToken, OrderId};
use reqwest::Method;
use tracing::instrument;

use super::types::{NewOrder, Order};
use super::{ApiClient, ApiError, segment};

impl ApiClient {
    /// Place an order for the signed-in user.
    ///
    /// The ordered products are dropped from the cache so their stock is
    /// read again.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the order (e.g. stock changed).
    #[instrument(skip(self, token, order), fields(items = order.order_items.len()))]
    pub async fn place_order(&self, token: &ApiToken, order: &NewOrder<'_>) -> Result<Order, ApiError> {
        let placed: Order = self.post("orders", Some(token), order).await?;
        for item in &order.order_items {
            self.invalidate_product(&item.product).await;
        }
        Ok(placed)
    }

    /// Orders of the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn my_orders(&self, token: &ApiToken) -> Result<Vec<Order>, ApiError> {
        self.get("orders/myorders", Some(token)).await
    }

    /// Every order (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn all_orders(&self, token: &ApiToken) -> Result<Vec<Order>, ApiError> {
        self.get("orders/all", Some(token)).await
    }

    /// Order detail. The backend only returns orders the token may see.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the order doesn't exist.
    #[instrument(skip(self, token), fields(order_id = %id))]
    pub async fn order(&self, token: &ApiToken, id: &OrderId) -> Result<Order, ApiError> {
        self.get(&format!("orders/{}", segment(id)), Some(token))
            .await
    }

    /// Mark an order as delivered (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(order_id = %id))]
    pub async fn mark_delivered(&self, token: &ApiToken, id: &OrderId) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("orders/{}/deliver", segment(id)))?;
        self.send_ignored(
            self.request(Method::PUT, url, Some(token))
                .json(&serde_json::json!({})),
        )
        .await
    }
}
