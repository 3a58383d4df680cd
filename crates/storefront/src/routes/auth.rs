//! Authentication route handlers.
//!
//! Login and registration go through the backend API, which answers with the
//! user record and a bearer token. Both are kept in the session as an
//! [`AuthSession`].

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use bestdeal_core::{AuthSession, Email, LoginResponse};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::api::ApiError;
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::Flash;
use crate::models::session::{clear_auth, set_auth};
use crate::state::AppState;
use crate::views::PageContext;

use super::safe_redirect;

/// Minimum password length accepted at registration.
const MIN_PASSWORD_LEN: usize = 6;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub redirect: Option<String>,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    #[serde(default)]
    pub redirect: Option<String>,
}

/// `?redirect=` on the login and registration pages.
#[derive(Debug, Default, Deserialize)]
pub struct RedirectQuery {
    pub redirect: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub page: PageContext,
    pub error: Option<String>,
    pub email: String,
    pub redirect: String,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub page: PageContext,
    pub errors: Vec<String>,
    pub name: String,
    pub email: String,
    pub redirect: String,
}

// =============================================================================
// Helpers
// =============================================================================

/// Store the session, greet the user, and send them where they were going.
async fn sign_in(session: &Session, response: LoginResponse, redirect: Option<&str>) -> Result<Response> {
    let auth = AuthSession::login(response);
    set_auth(session, &auth).await?;
    set_sentry_user(&auth.user.id, Some(&auth.user.email));
    tracing::info!(user_id = %auth.user.id, admin = auth.is_admin(), "User signed in");

    Flash::success(session, format!("¡Hola, {}!", auth.user.first_name())).await;
    Ok(Redirect::to(safe_redirect(redirect)).into_response())
}

/// Registration form problems, in form order.
fn validate_registration(form: &RegisterForm) -> std::result::Result<Email, Vec<String>> {
    let mut errors = Vec::new();
    if form.name.trim().is_empty() {
        errors.push("Ingresa tu nombre.".to_string());
    }
    let email = Email::parse(&form.email)
        .inspect_err(|_| errors.push("Ingresa un email válido.".to_string()))
        .ok();
    if form.password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(format!(
            "La contraseña debe tener al menos {MIN_PASSWORD_LEN} caracteres."
        ));
    }
    if form.password != form.password_confirm {
        errors.push("Las contraseñas no coinciden.".to_string());
    }

    match email {
        Some(email) if errors.is_empty() => Ok(email),
        _ => Err(errors),
    }
}

/// The message to show when the backend refuses credentials or a signup.
fn rejection_message(err: &ApiError) -> String {
    match err {
        ApiError::Unauthorized(message) if !message.trim().is_empty() => message.clone(),
        ApiError::Unauthorized(_) => "Email o contraseña incorrectos.".to_string(),
        other => other.user_message(),
    }
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
///
/// Visitors already signed in go straight to their destination.
#[instrument(skip(session, auth))]
pub async fn login_page(
    session: Session,
    OptionalAuth(auth): OptionalAuth,
    Query(query): Query<RedirectQuery>,
) -> Response {
    if auth.is_some() {
        return Redirect::to(safe_redirect(query.redirect.as_deref())).into_response();
    }

    LoginTemplate {
        page: PageContext::load(&session).await,
        error: None,
        email: String::new(),
        redirect: safe_redirect(query.redirect.as_deref()).to_string(),
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let redirect = safe_redirect(form.redirect.as_deref()).to_string();
    let render_error = |session: Session, email: String, error: String, status: StatusCode| async move {
        let page = PageContext::load(&session).await;
        (
            status,
            LoginTemplate {
                page,
                error: Some(error),
                email,
                redirect,
            },
        )
            .into_response()
    };

    let Ok(email) = Email::parse(&form.email) else {
        return Ok(render_error(
            session,
            form.email.trim().to_string(),
            "Ingresa un email válido.".to_string(),
            StatusCode::UNPROCESSABLE_ENTITY,
        )
        .await);
    };
    if form.password.is_empty() {
        return Ok(render_error(
            session,
            email.into_inner(),
            "Ingresa tu contraseña.".to_string(),
            StatusCode::UNPROCESSABLE_ENTITY,
        )
        .await);
    }

    match state.api().login(email.as_str(), &form.password).await {
        Ok(response) => sign_in(&session, response, form.redirect.as_deref()).await,
        Err(e) => {
            let status = if e.is_client_error() {
                tracing::info!(error = %e, "Login refused");
                StatusCode::UNAUTHORIZED
            } else {
                tracing::error!(error = %e, "Login request failed");
                StatusCode::BAD_GATEWAY
            };
            Ok(render_error(session, email.into_inner(), rejection_message(&e), status).await)
        }
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
#[instrument(skip(session, auth))]
pub async fn register_page(
    session: Session,
    OptionalAuth(auth): OptionalAuth,
    Query(query): Query<RedirectQuery>,
) -> Response {
    if auth.is_some() {
        return Redirect::to(safe_redirect(query.redirect.as_deref())).into_response();
    }

    RegisterTemplate {
        page: PageContext::load(&session).await,
        errors: Vec::new(),
        name: String::new(),
        email: String::new(),
        redirect: safe_redirect(query.redirect.as_deref()).to_string(),
    }
    .into_response()
}

/// Handle registration; a successful signup signs the user in.
#[instrument(skip(state, session, form))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let outcome = match validate_registration(&form) {
        Ok(email) => state
            .api()
            .register(form.name.trim(), email.as_str(), &form.password)
            .await
            .map_err(|e| {
                if e.is_client_error() {
                    tracing::info!(error = %e, "Registration refused");
                    (StatusCode::UNPROCESSABLE_ENTITY, vec![rejection_message(&e)])
                } else {
                    tracing::error!(error = %e, "Registration request failed");
                    (StatusCode::BAD_GATEWAY, vec![e.user_message()])
                }
            }),
        Err(errors) => Err((StatusCode::UNPROCESSABLE_ENTITY, errors)),
    };

    match outcome {
        Ok(response) => sign_in(&session, response, form.redirect.as_deref()).await,
        Err((status, errors)) => Ok((
            status,
            RegisterTemplate {
                page: PageContext::load(&session).await,
                errors,
                name: form.name.trim().to_string(),
                email: form.email.trim().to_string(),
                redirect: safe_redirect(form.redirect.as_deref()).to_string(),
            },
        )
            .into_response()),
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Handle logout. The cart stays with the visitor.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Response> {
    clear_auth(&session).await?;
    clear_sentry_user();
    Flash::info(&session, "Cerraste sesión.").await;
    Ok(Redirect::to("/").into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(name: &str, email: &str, password: &str, confirm: &str) -> RegisterForm {
        RegisterForm {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            password_confirm: confirm.to_string(),
            redirect: None,
        }
    }

    #[test]
    fn test_valid_registration() {
        let email = validate_registration(&form("Ana", " Ana@X.co ", "secreto", "secreto"));
        assert_eq!(email.map(Email::into_inner), Ok("ana@x.co".to_string()));
    }

    #[test]
    fn test_registration_collects_every_problem() {
        let errors = validate_registration(&form(" ", "ana", "123", "124")).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert_eq!(errors[0], "Ingresa tu nombre.");
        assert_eq!(errors[3], "Las contraseñas no coinciden.");
    }

    #[test]
    fn test_rejection_message_prefers_backend_text() {
        let err = ApiError::Unauthorized("Credenciales inválidas".to_string());
        assert_eq!(rejection_message(&err), "Credenciales inválidas");

        let err = ApiError::Unauthorized(String::new());
        assert_eq!(rejection_message(&err), "Email o contraseña incorrectos.");

        let err = ApiError::Api {
            status: 400,
            message: "El usuario ya existe".to_string(),
        };
        assert_eq!(rejection_message(&err), "El usuario ya existe");
    }
}
