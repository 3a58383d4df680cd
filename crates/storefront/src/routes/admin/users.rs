//! Admin user management.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use bestdeal_core::UserId;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::models::Flash;
use crate::state::AppState;
use crate::views::PageContext;

use super::super::flash_api_error;

#[derive(Clone)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
    pub is_self: bool,
}

/// User list template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/users.html")]
pub struct UserListTemplate {
    pub page: PageContext,
    pub users: Vec<UserRow>,
}

/// List every registered user.
#[instrument(skip(state, session, auth))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(auth): RequireAdmin,
) -> Result<Response> {
    let users = state.api().users(&auth.token).await?;

    Ok(UserListTemplate {
        page: PageContext::load(&session).await,
        users: users
            .into_iter()
            .map(|user| UserRow {
                is_self: user.id == auth.user.id,
                id: user.id.to_string(),
                name: user.name,
                email: user.email,
                is_admin: user.role.is_admin(),
            })
            .collect(),
    }
    .into_response())
}

/// Delete a user. Admins cannot delete their own account from here.
#[instrument(skip(state, session, auth), fields(user_id = %id))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(auth): RequireAdmin,
    Path(id): Path<UserId>,
) -> Result<Response> {
    if id == auth.user.id {
        Flash::error(&session, "No puedes eliminar tu propia cuenta.").await;
        return Ok(Redirect::to("/admin/usuarios").into_response());
    }

    match state.api().delete_user(&auth.token, &id).await {
        Ok(()) => {
            tracing::info!("User deleted");
            Flash::success(&session, "Usuario eliminado.").await;
        }
        Err(e) => flash_api_error(&session, e).await?,
    }
    Ok(Redirect::to("/admin/usuarios").into_response())
}
