//! Admin home banner management: add, reorder and delete.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, State},
    response::{IntoResponse, Redirect, Response},
};
use bestdeal_core::{ApiToken, BannerId};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::models::Flash;
use crate::state::AppState;
use crate::views::PageContext;

use super::super::flash_api_error;
use super::form::MultipartForm;

const BANNERS_PATH: &str = "/admin/banners";

#[derive(Clone)]
pub struct BannerRow {
    pub id: String,
    pub image_url: String,
    pub position: usize,
    pub is_first: bool,
    pub is_last: bool,
}

/// Banner management template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/banners.html")]
pub struct BannerListTemplate {
    pub page: PageContext,
    pub banners: Vec<BannerRow>,
    pub uploads_enabled: bool,
}

/// List banners in display order.
#[instrument(skip(state, session, _auth))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(_auth): RequireAdmin,
) -> Result<Response> {
    let banners = state.api().banners().await?;
    let count = banners.len();

    Ok(BannerListTemplate {
        page: PageContext::load(&session).await,
        banners: banners
            .into_iter()
            .enumerate()
            .map(|(i, banner)| BannerRow {
                id: banner.id.to_string(),
                image_url: banner.image_url,
                position: i + 1,
                is_first: i == 0,
                is_last: i + 1 == count,
            })
            .collect(),
        uploads_enabled: state.api().uploads_enabled(),
    }
    .into_response())
}

/// Add a banner from an uploaded file or an image URL.
#[instrument(skip(state, session, auth, multipart))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(auth): RequireAdmin,
    multipart: Multipart,
) -> Result<Response> {
    let form = MultipartForm::read(multipart).await?;
    let url_field = form.text("image_url").to_string();

    let image_url = match form.image {
        Some(image) => match state.api().upload_image(&auth.token, image).await {
            Ok(url) => url,
            Err(e) => {
                flash_api_error(&session, e).await?;
                return Ok(Redirect::to(BANNERS_PATH).into_response());
            }
        },
        None if url_field.starts_with("https://") || url_field.starts_with("http://") => url_field,
        None => {
            Flash::error(&session, "Sube una imagen o escribe su URL.").await;
            return Ok(Redirect::to(BANNERS_PATH).into_response());
        }
    };

    match state.api().create_banner(&auth.token, &image_url).await {
        Ok(()) => {
            tracing::info!("Banner created");
            Flash::success(&session, "Banner agregado.").await;
        }
        Err(e) => flash_api_error(&session, e).await?,
    }
    Ok(Redirect::to(BANNERS_PATH).into_response())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Up,
    Down,
}

/// The display order with `id` swapped one place over, or `None` when it
/// is missing or already at that end.
fn reordered(ids: &[BannerId], id: &BannerId, direction: Direction) -> Option<Vec<BannerId>> {
    let index = ids.iter().position(|candidate| candidate == id)?;
    let other = match direction {
        Direction::Up => index.checked_sub(1)?,
        Direction::Down => Some(index + 1).filter(|other| *other < ids.len())?,
    };
    let mut ids = ids.to_vec();
    ids.swap(index, other);
    Some(ids)
}

async fn move_banner(
    state: &AppState,
    session: &Session,
    token: &ApiToken,
    id: &BannerId,
    direction: Direction,
) -> Result<Response> {
    let ids: Vec<BannerId> = state
        .api()
        .banners()
        .await?
        .into_iter()
        .map(|banner| banner.id)
        .collect();

    if let Some(order) = reordered(&ids, id, direction)
        && let Err(e) = state.api().reorder_banners(token, &order).await
    {
        flash_api_error(session, e).await?;
    }
    Ok(Redirect::to(BANNERS_PATH).into_response())
}

/// Move a banner one place earlier.
#[instrument(skip(state, session, auth), fields(banner_id = %id))]
pub async fn move_up(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(auth): RequireAdmin,
    Path(id): Path<BannerId>,
) -> Result<Response> {
    move_banner(&state, &session, &auth.token, &id, Direction::Up).await
}

/// Move a banner one place later.
#[instrument(skip(state, session, auth), fields(banner_id = %id))]
pub async fn move_down(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(auth): RequireAdmin,
    Path(id): Path<BannerId>,
) -> Result<Response> {
    move_banner(&state, &session, &auth.token, &id, Direction::Down).await
}

/// Delete a banner.
#[instrument(skip(state, session, auth), fields(banner_id = %id))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(auth): RequireAdmin,
    Path(id): Path<BannerId>,
) -> Result<Response> {
    match state.api().delete_banner(&auth.token, &id).await {
        Ok(()) => Flash::success(&session, "Banner eliminado.").await,
        Err(e) => flash_api_error(&session, e).await?,
    }
    Ok(Redirect::to(BANNERS_PATH).into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<BannerId> {
        raw.iter().map(|id| BannerId::parse(id).unwrap()).collect()
    }

    #[test]
    fn test_reordered_swaps_neighbours() {
        let order = ids(&["a", "b", "c"]);
        let b = BannerId::parse("b").unwrap();
        assert_eq!(reordered(&order, &b, Direction::Up), Some(ids(&["b", "a", "c"])));
        assert_eq!(reordered(&order, &b, Direction::Down), Some(ids(&["a", "c", "b"])));
    }

    #[test]
    fn test_reordered_stops_at_ends() {
        let order = ids(&["a", "b"]);
        let a = BannerId::parse("a").unwrap();
        let b = BannerId::parse("b").unwrap();
        let missing = BannerId::parse("z").unwrap();
        assert_eq!(reordered(&order, &a, Direction::Up), None);
        assert_eq!(reordered(&order, &b, Direction::Down), None);
        assert_eq!(reordered(&order, &missing, Direction::Up), None);
    }
}
