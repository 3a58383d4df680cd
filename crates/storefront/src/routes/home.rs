//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tower_sessions::Session;
use tracing::instrument;

use crate::filters;
use crate::state::AppState;
use crate::views::{PageContext, ProductCard};

/// Number of recent products shown on the home page.
const RECENT_PRODUCTS: usize = 8;

#[derive(Clone)]
pub struct BannerSlide {
    pub image_url: String,
    pub alt: String,
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub page: PageContext,
    pub banners: Vec<BannerSlide>,
    pub products: Vec<ProductCard>,
    pub catalog_unavailable: bool,
}

/// Display the home page.
///
/// The banner strip and product grid are independent; either can fail
/// without taking the page down.
#[instrument(skip(state, session))]
pub async fn home(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    let (banners, products) = tokio::join!(state.api().banners(), state.api().recent_products());

    let banners = banners
        .inspect_err(|e| tracing::warn!(error = %e, "Failed to load banners"))
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(i, banner)| BannerSlide {
            image_url: banner.image_url,
            alt: format!("Promoción {}", i + 1),
        })
        .collect();

    let (products, catalog_unavailable) = match products {
        Ok(products) => (
            products
                .iter()
                .take(RECENT_PRODUCTS)
                .map(ProductCard::from)
                .collect(),
            false,
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load recent products");
            (Vec::new(), true)
        }
    };

    HomeTemplate {
        page: PageContext::load(&session).await,
        banners,
        products,
        catalog_unavailable,
    }
}
