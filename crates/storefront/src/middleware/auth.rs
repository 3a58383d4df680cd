//! Authentication extractors and session-expiry handling.
//!
//! Provides extractors for requiring a signed-in user (or an admin) in route
//! handlers. Anonymous visitors are redirected to the login page with a
//! `redirect` parameter so they land back where they started.

use axum::{
    extract::{FromRequestParts, OriginalUri, Request},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use bestdeal_core::AuthSession;
use tower_sessions::Session;

use crate::error::{SessionExpired, clear_sentry_user};
use crate::models::Flash;
use crate::models::session::{clear_auth, current_auth};

/// Build the login URL that returns to `path` afterwards.
#[must_use]
pub fn login_redirect_url(path: &str) -> String {
    format!("/login?redirect={}", urlencoding::encode(path))
}

/// Extractor that requires a signed-in user.
///
/// If nobody is signed in, redirects to `/login?redirect=<current path>`.
///
/// # Example
///
/// ```rust,ignore
/// async fn profile(RequireAuth(auth): RequireAuth) -> impl IntoResponse {
///     format!("Hola, {}!", auth.user.name)
/// }
/// ```
pub struct RequireAuth(pub AuthSession);

/// Extractor that requires a signed-in admin.
///
/// Anonymous visitors go to the login page; signed-in non-admins are sent
/// home with an error flash.
pub struct RequireAdmin(pub AuthSession);

/// Rejection for the auth extractors.
#[derive(Debug)]
pub enum AuthRejection {
    /// Redirect to the login page, then back to this path.
    RedirectToLogin(String),
    /// Signed in but not an admin.
    Forbidden,
    /// Session layer missing (misconfigured router).
    MissingSession,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin(path) => Redirect::to(&login_redirect_url(&path)).into_response(),
            Self::Forbidden => Redirect::to("/").into_response(),
            Self::MissingSession => {
                tracing::error!("Session layer missing from router");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

/// Path and query the visitor asked for.
///
/// Nested routers see the URI without their prefix, so the original URI is
/// preferred when the router recorded it.
fn return_path(parts: &Parts) -> String {
    let uri = parts
        .extensions
        .get::<OriginalUri>()
        .map_or(&parts.uri, |original| &original.0);
    uri.path_and_query()
        .map_or_else(|| uri.path().to_string(), ToString::to_string)
}

async fn require_session(parts: &Parts) -> Result<(Session, AuthSession), AuthRejection> {
    let session = parts
        .extensions
        .get::<Session>()
        .cloned()
        .ok_or(AuthRejection::MissingSession)?;

    let Some(auth) = current_auth(&session).await else {
        return Err(AuthRejection::RedirectToLogin(return_path(parts)));
    };

    Ok((session, auth))
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let (_, auth) = require_session(parts).await?;
        Ok(Self(auth))
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let (session, auth) = require_session(parts).await?;
        if !auth.is_admin() {
            tracing::warn!(user_id = %auth.user.id, path = %parts.uri.path(), "Non-admin tried to open admin page");
            Flash::error(&session, "No tienes permisos para acceder a esa página.").await;
            return Err(AuthRejection::Forbidden);
        }
        Ok(Self(auth))
    }
}

/// Extractor that optionally gets the signed-in user.
///
/// Unlike `RequireAuth`, this does not reject anonymous visitors.
pub struct OptionalAuth(pub Option<AuthSession>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth = match parts.extensions.get::<Session>() {
            Some(session) => current_auth(session).await,
            None => None,
        };

        Ok(Self(auth))
    }
}

/// Log the visitor out when the backend rejected their token.
///
/// Runs inside the session layer. Handlers signal an expired token by
/// returning `AppError::Api(ApiError::Unauthorized)`, which tags the
/// response with [`SessionExpired`].
pub async fn session_expiry_middleware(request: Request, next: Next) -> Response {
    let session = request.extensions().get::<Session>().cloned();
    let response = next.run(request).await;

    if response.extensions().get::<SessionExpired>().is_some()
        && let Some(session) = session
    {
        tracing::info!("Backend rejected the session token, logging out");
        if let Err(e) = clear_auth(&session).await {
            tracing::warn!(error = %e, "Failed to clear expired auth session");
        }
        clear_sentry_user();
        Flash::info(&session, "Tu sesión expiró, inicia sesión de nuevo.").await;
    }

    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_login_redirect_url_encodes_path() {
        assert_eq!(login_redirect_url("/envio"), "/login?redirect=%2Fenvio");
        assert_eq!(
            login_redirect_url("/soporte/nuevo?pedido=abc"),
            "/login?redirect=%2Fsoporte%2Fnuevo%3Fpedido%3Dabc"
        );
    }

    #[test]
    fn test_return_path_keeps_nested_prefix() {
        let (mut parts, ()) = axum::http::Request::builder()
            .uri("/pedidos?pagina=2")
            .body(())
            .unwrap()
            .into_parts();
        assert_eq!(return_path(&parts), "/pedidos?pagina=2");

        parts
            .extensions
            .insert(OriginalUri("/admin/pedidos?pagina=2".parse().unwrap()));
        assert_eq!(return_path(&parts), "/admin/pedidos?pagina=2");
    }

    #[test]
    fn test_rejection_responses() {
        let response = AuthRejection::RedirectToLogin("/perfil".to_string()).into_response();
        assert_eq!(response.headers()["location"], "/login?redirect=%2Fperfil");

        let response = AuthRejection::Forbidden.into_response();
        assert_eq!(response.headers()["location"], "/");
    }
}
