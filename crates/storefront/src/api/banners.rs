//! Home page banners.

use bestdeal_core::{ApiToken, BannerId};
use reqwest::Method;
use tracing::instrument;

use super::cache::{CacheKey, CacheValue};
use super::types::{Banner, BannerOrder, NewBanner};
use super::{ApiClient, ApiError, segment};

impl ApiClient {
    /// Banners in display order.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn banners(&self) -> Result<Vec<Banner>, ApiError> {
        if let Some(CacheValue::Banners(banners)) = self.inner.cache.get(&CacheKey::Banners).await
        {
            return Ok(banners);
        }

        let mut banners: Vec<Banner> = self.get("banners", None).await?;
        // Stable: banners without an explicit position keep API order.
        banners.sort_by_key(|banner| banner.order.unwrap_or(i64::MAX));
        self.inner
            .cache
            .insert(CacheKey::Banners, CacheValue::Banners(banners.clone()))
            .await;
        Ok(banners)
    }

    /// Add a banner pointing at an uploaded image (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the banner.
    #[instrument(skip(self, token))]
    pub async fn create_banner(&self, token: &ApiToken, image_url: &str) -> Result<(), ApiError> {
        let url = self.endpoint("banners")?;
        self.send_ignored(
            self.request(Method::POST, url, Some(token))
                .json(&NewBanner { image_url }),
        )
        .await?;
        self.inner.cache.invalidate(&CacheKey::Banners).await;
        Ok(())
    }

    /// Persist a new display order (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token, banner_ids), fields(count = banner_ids.len()))]
    pub async fn reorder_banners(
        &self,
        token: &ApiToken,
        banner_ids: &[BannerId],
    ) -> Result<(), ApiError> {
        let url = self.endpoint("banners/order")?;
        self.send_ignored(
            self.request(Method::PUT, url, Some(token))
                .json(&BannerOrder { banner_ids }),
        )
        .await?;
        self.inner.cache.invalidate(&CacheKey::Banners).await;
        Ok(())
    }

    /// Delete a banner (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(banner_id = %id))]
    pub async fn delete_banner(&self, token: &ApiToken, id: &BannerId) -> Result<(), ApiError> {
        self.delete(&format!("banners/{}", segment(id)), token)
            .await?;
        self.inner.cache.invalidate(&CacheKey::Banners).await;
        Ok(())
    }
}
