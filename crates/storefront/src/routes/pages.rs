//! Static page route handlers: about and contact.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use bestdeal_core::Email;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::filters;
use crate::models::Flash;
use crate::views::PageContext;

/// Longest contact message accepted.
const MAX_MESSAGE_LEN: usize = 2000;

/// About page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/about.html")]
pub struct AboutTemplate {
    pub page: PageContext,
}

/// Display the about page.
pub async fn about(session: Session) -> impl IntoResponse {
    AboutTemplate {
        page: PageContext::load(&session).await,
    }
}

/// Contact form data.
#[derive(Debug, Default, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// Contact page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/contact.html")]
pub struct ContactTemplate {
    pub page: PageContext,
    pub errors: Vec<&'static str>,
    pub form: ContactForm,
}

/// Display the contact form.
pub async fn contact_page(session: Session) -> impl IntoResponse {
    ContactTemplate {
        page: PageContext::load(&session).await,
        errors: Vec::new(),
        form: ContactForm::default(),
    }
}

fn validate_contact(form: &ContactForm) -> Vec<&'static str> {
    let mut errors = Vec::new();
    if form.name.trim().is_empty() {
        errors.push("Ingresa tu nombre.");
    }
    if Email::parse(&form.email).is_err() {
        errors.push("Ingresa un email válido.");
    }
    let message = form.message.trim();
    if message.is_empty() {
        errors.push("Escribe tu mensaje.");
    } else if message.chars().count() > MAX_MESSAGE_LEN {
        errors.push("El mensaje es demasiado largo.");
    }
    errors
}

/// Handle the contact form.
///
/// Messages are acknowledged and logged; there is no backend endpoint for
/// them.
#[instrument(skip(session, form))]
pub async fn contact(session: Session, Form(form): Form<ContactForm>) -> Response {
    let errors = validate_contact(&form);
    if !errors.is_empty() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            ContactTemplate {
                page: PageContext::load(&session).await,
                errors,
                form,
            },
        )
            .into_response();
    }

    tracing::info!(
        email = %form.email.trim(),
        length = form.message.trim().len(),
        "Contact message received"
    );
    Flash::success(
        &session,
        format!(
            "Gracias, {}. Te responderemos lo antes posible.",
            form.name.trim()
        ),
    )
    .await;
    Redirect::to("/contacto").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_contact() {
        let form = ContactForm {
            name: "Ana".to_string(),
            email: "ana@x.co".to_string(),
            message: "Hola".to_string(),
        };
        assert!(validate_contact(&form).is_empty());

        let form = ContactForm {
            name: String::new(),
            email: "sin-arroba".to_string(),
            message: "x".repeat(MAX_MESSAGE_LEN + 1),
        };
        assert_eq!(
            validate_contact(&form),
            vec![
                "Ingresa tu nombre.",
                "Ingresa un email válido.",
                "El mensaje es demasiado largo."
            ]
        );
    }
}
