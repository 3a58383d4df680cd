//! Admin image uploads.
//!
//! The backend signs the upload; the file itself goes straight from the
//! storefront to the image host, which answers with the public URL.

use bestdeal_core::ApiToken;
use reqwest::multipart::{Form, Part};
use tracing::instrument;

use super::types::{UploadSignature, UploadedImage};
use super::{ApiClient, ApiError};

/// An image received from an admin form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ApiClient {
    /// Upload an image and return its public URL.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotConfigured` when no image host is set up, or
    /// `ApiError::Upload` when the host rejects the file.
    #[instrument(skip(self, token, image), fields(file_name = %image.file_name, size = image.bytes.len()))]
    pub async fn upload_image(
        &self,
        token: &ApiToken,
        image: ImageUpload,
    ) -> Result<String, ApiError> {
        let media = self
            .inner
            .media
            .as_ref()
            .ok_or(ApiError::NotConfigured("La subida de imágenes"))?;

        let signature: UploadSignature = self.get("upload/signature", Some(token)).await?;
        let timestamp = match signature.timestamp {
            serde_json::Value::String(timestamp) => timestamp,
            other => other.to_string(),
        };

        let mut part = Part::bytes(image.bytes).file_name(image.file_name);
        if let Some(content_type) = image.content_type.as_deref() {
            part = part
                .mime_str(content_type)
                .map_err(|e| ApiError::Upload(e.to_string()))?;
        }

        let form = Form::new()
            .part("file", part)
            .text("api_key", media.api_key.clone())
            .text("timestamp", timestamp)
            .text("signature", signature.signature);

        let response = self
            .inner
            .http
            .post(media.upload_url())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %body.chars().take(300).collect::<String>(), "Image upload rejected");
            return Err(ApiError::Upload(format!("image host returned {status}")));
        }

        let uploaded: UploadedImage = response
            .json()
            .await
            .map_err(|e| ApiError::Upload(e.to_string()))?;
        Ok(uploaded.secure_url)
    }
}
