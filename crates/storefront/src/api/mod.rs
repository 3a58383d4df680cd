//! Client for the BestDeal REST API.
//!
//! # Architecture
//!
//! - The backend owns every persistent entity; the storefront makes direct
//!   calls and never stores copies beyond the read-through cache
//! - JSON bodies, `Authorization: Bearer <token>` on protected endpoints
//! - Error bodies look like `{"message": "..."}` and are surfaced verbatim
//!   for client errors
//! - In-memory caching via `moka` for catalog reads (categories, brands,
//!   single products, recent products, banners)
//!
//! Endpoint methods live in one file per concern and are all inherent
//! methods of [`ApiClient`].
//!
//! # Example
//!
//! ```rust,ignore
//! use bestdeal_storefront::api::{ApiClient, ProductQuery};
//!
//! let client = ApiClient::new(&config.api, config.media.clone())?;
//! let page = client.products(&ProductQuery::default()).await?;
//! let product = client.product(&page.products[0].id).await?;
//! ```

mod banners;
mod cache;
mod catalog;
mod dashboard;
mod media;
mod orders;
mod support;
pub mod types;
mod users;

pub use media::ImageUpload;
pub use types::*;

use std::borrow::Cow;
use std::sync::Arc;

use bestdeal_core::ApiToken;
use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use thiserror::Error;
use url::Url;

use crate::config::{ApiConfig, MediaConfig};

use cache::{CacheKey, CacheValue};

const USER_AGENT: &str = concat!("bestdeal-storefront/", env!("CARGO_PKG_VERSION"));

/// Errors that can occur when calling the backend API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Missing, expired or rejected bearer token.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the API.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Image host rejected the upload.
    #[error("Upload error: {0}")]
    Upload(String),

    /// An optional integration is not configured.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    /// Endpoint path could not be joined to the base URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ApiError {
    /// Whether the backend rejected the request itself (4xx), as opposed to
    /// being unreachable or failing.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        match self {
            Self::Api { status, .. } => *status >= 400 && *status < 500,
            Self::Unauthorized(_) | Self::NotFound(_) => true,
            _ => false,
        }
    }

    /// Message suitable for a flash notification.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api { message, .. } if self.is_client_error() => message.clone(),
            Self::Unauthorized(_) => "Tu sesión expiró, inicia sesión de nuevo.".to_string(),
            Self::NotFound(_) => "No encontramos lo que buscabas.".to_string(),
            Self::RateLimited(_) => {
                "Demasiadas solicitudes, intenta de nuevo en unos segundos.".to_string()
            }
            Self::Upload(_) => "Error al subir la imagen.".to_string(),
            Self::NotConfigured(what) => format!("{what} no está disponible."),
            _ => "No pudimos conectar con el servidor, intenta más tarde.".to_string(),
        }
    }
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the BestDeal REST API.
///
/// Cheap to clone; all clones share one connection pool and cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: Url,
    cache: Cache<CacheKey, CacheValue>,
    media: Option<MediaConfig>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &ApiConfig, media: Option<MediaConfig>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url: config.base_url.clone(),
                cache,
                media,
            }),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Whether admin image uploads are available.
    #[must_use]
    pub fn uploads_enabled(&self) -> bool {
        self.inner.media.is_some()
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path.trim_start_matches('/'))?)
    }

    fn request(
        &self,
        method: Method,
        url: Url,
        token: Option<&ApiToken>,
    ) -> RequestBuilder {
        let request = self.inner.http.request(method, url);
        match token {
            Some(token) => request.bearer_auth(token.expose()),
            None => request,
        }
    }

    /// Send a request and check the status, returning the raw body.
    async fn execute(&self, request: RequestBuilder) -> Result<String, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        let body = response.text().await?;
        if status.is_success() {
            return Ok(body);
        }

        let message = error_message(&body)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
        if status.is_server_error() {
            tracing::error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "BestDeal API returned a server error"
            );
        }

        Err(match status {
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized(message),
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            _ => ApiError::Api {
                status: status.as_u16(),
                message,
            },
        })
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let body = self.execute(request).await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse BestDeal API response"
            );
            ApiError::Parse(e)
        })
    }

    /// Send a request whose response body is not needed.
    async fn send_ignored(&self, request: RequestBuilder) -> Result<(), ApiError> {
        let body = self.execute(request).await?;
        if !body.trim().is_empty() {
            serde_json::from_str::<IgnoredAny>(&body)?;
        }
        Ok(())
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&ApiToken>,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        self.send(self.request(Method::GET, url, token)).await
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&ApiToken>,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        self.send(self.request(Method::POST, url, token).json(body))
            .await
    }

    async fn put<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&ApiToken>,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        self.send(self.request(Method::PUT, url, token).json(body))
            .await
    }

    async fn delete(&self, path: &str, token: &ApiToken) -> Result<(), ApiError> {
        let url = self.endpoint(path)?;
        self.send_ignored(self.request(Method::DELETE, url, Some(token)))
            .await
    }
}

/// Percent-encode an id for use as a path segment.
fn segment(id: &impl AsRef<str>) -> Cow<'_, str> {
    urlencoding::encode(id.as_ref())
}

/// Extract `message` from a `{"message": "..."}` error body.
fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ApiMessage>(body)
        .ok()
        .map(|m| m.message)
        .filter(|m| !m.trim().is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client() -> ApiClient {
        let config = ApiConfig::new("http://localhost:4000/api").unwrap();
        ApiClient::new(&config, None).unwrap()
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = client();
        assert_eq!(
            client.endpoint("/orders/myorders").unwrap().as_str(),
            "http://localhost:4000/api/orders/myorders"
        );
        assert_eq!(
            client.endpoint("summary").unwrap().as_str(),
            "http://localhost:4000/api/summary"
        );
    }

    #[test]
    fn test_segment_encodes_slashes() {
        assert_eq!(segment(&"a/b c"), "a%2Fb%20c");
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            error_message(r#"{"message":"Email o contraseña inválidos"}"#).as_deref(),
            Some("Email o contraseña inválidos")
        );
        assert_eq!(error_message("<html>502</html>"), None);
        assert_eq!(error_message(r#"{"message":"  "}"#), None);
    }

    #[test]
    fn test_user_message_exposes_only_client_errors() {
        let rejected = ApiError::Api {
            status: 400,
            message: "El usuario ya existe".to_string(),
        };
        assert_eq!(rejected.user_message(), "El usuario ya existe");

        let failed = ApiError::Api {
            status: 500,
            message: "MongoError: connection reset".to_string(),
        };
        assert!(!failed.user_message().contains("Mongo"));
        assert!(!failed.is_client_error());
    }

    #[test]
    fn test_uploads_disabled_without_media() {
        assert!(!client().uploads_enabled());
    }
}
