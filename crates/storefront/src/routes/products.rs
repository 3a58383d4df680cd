//! Catalog route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use bestdeal_core::{CategoryId, Pagination, ProductId};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::api::{Category, ProductQuery, ProductSort};
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::Flash;
use crate::state::AppState;
use crate::views::{PageContext, ProductCard, format_date};

use super::flash_api_error;

/// Most units of one product a visitor can pick at once.
const MAX_QUANTITY_CHOICE: u32 = 10;

// =============================================================================
// Catalog listing
// =============================================================================

/// Shop filters as they appear in the query string.
///
/// Empty values (from a form's "all" option) count as unset.
#[derive(Debug, Default, Deserialize)]
pub struct ShopQuery {
    pub categoria: Option<String>,
    pub buscar: Option<String>,
    pub orden: Option<String>,
    pub pagina: Option<String>,
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

impl ShopQuery {
    fn to_api_query(&self) -> ProductQuery {
        ProductQuery {
            category: non_empty(self.categoria.as_ref()).and_then(|id| CategoryId::parse(id).ok()),
            search: non_empty(self.buscar.as_ref()).map(ToString::to_string),
            sort: match non_empty(self.orden.as_ref()) {
                Some("price-asc") => Some(ProductSort::PriceAsc),
                Some("price-desc") => Some(ProductSort::PriceDesc),
                _ => None,
            },
            page: non_empty(self.pagina.as_ref())
                .and_then(|page| page.parse::<u32>().ok())
                .filter(|page| *page > 1),
        }
    }
}

/// Category option for the filter sidebar.
#[derive(Clone)]
pub struct CategoryOption {
    pub id: String,
    pub name: String,
    pub selected: bool,
}

/// A page link that keeps the current filters.
#[derive(Clone)]
pub struct PageLink {
    pub number: u32,
    pub url: String,
    pub current: bool,
}

/// Shop page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductIndexTemplate {
    pub page: PageContext,
    pub products: Vec<ProductCard>,
    pub categories: Vec<CategoryOption>,
    pub search: String,
    pub sort: String,
    pub pages: Vec<PageLink>,
    pub previous_url: Option<String>,
    pub next_url: Option<String>,
}

fn page_url(query: &ProductQuery, page: u32) -> String {
    let mut url = url::form_urlencoded::Serializer::new(String::new());
    if let Some(category) = &query.category {
        url.append_pair("categoria", category.as_str());
    }
    if let Some(search) = &query.search {
        url.append_pair("buscar", search);
    }
    if let Some(sort) = query.sort {
        url.append_pair("orden", sort.as_str());
    }
    if page > 1 {
        url.append_pair("pagina", &page.to_string());
    }
    let query_string = url.finish();
    if query_string.is_empty() {
        "/tienda".to_string()
    } else {
        format!("/tienda?{query_string}")
    }
}

fn category_options(categories: Vec<Category>, selected: Option<&CategoryId>) -> Vec<CategoryOption> {
    categories
        .into_iter()
        .map(|category| CategoryOption {
            selected: selected == Some(&category.id),
            id: category.id.to_string(),
            name: category.name,
        })
        .collect()
}

/// Display the shop with filters, sorting and pagination.
#[instrument(skip(state, session))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    Query(shop): Query<ShopQuery>,
) -> Result<Response> {
    let query = shop.to_api_query();
    let (listing, categories) = tokio::join!(state.api().products(&query), state.api().categories());
    let listing = listing?;
    let categories = categories
        .inspect_err(|e| tracing::warn!(error = %e, "Failed to load categories"))
        .unwrap_or_default();

    let pagination = Pagination::new(listing.page, listing.pages);
    let pages = if pagination.is_visible() {
        pagination
            .pages()
            .into_iter()
            .map(|number| PageLink {
                number,
                url: page_url(&query, number),
                current: number == pagination.current(),
            })
            .collect()
    } else {
        Vec::new()
    };

    Ok(ProductIndexTemplate {
        page: PageContext::load(&session).await,
        products: listing.products.iter().map(ProductCard::from).collect(),
        categories: category_options(categories, query.category.as_ref()),
        search: query.search.clone().unwrap_or_default(),
        sort: query.sort.map(ProductSort::as_str).unwrap_or_default().to_string(),
        previous_url: pagination.previous().map(|p| page_url(&query, p)),
        next_url: pagination.next().map(|p| page_url(&query, p)),
        pages,
    }
    .into_response())
}

// =============================================================================
// Product detail
// =============================================================================

#[derive(Clone)]
pub struct ReviewView {
    pub name: String,
    pub rating: u8,
    pub comment: String,
    pub date: String,
}

/// Product detail template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub page: PageContext,
    pub product: ProductCard,
    pub description: String,
    pub stock_label: String,
    pub quantity_choices: Vec<u32>,
    pub reviews: Vec<ReviewView>,
}

fn stock_label(stock: Option<u32>) -> String {
    match stock {
        Some(0) => "Agotado".to_string(),
        Some(1) => "¡Última unidad!".to_string(),
        Some(n) if n <= 5 => format!("Solo quedan {n} unidades"),
        _ => "Disponible".to_string(),
    }
}

/// Display a product with its reviews.
#[instrument(skip(state, session), fields(product_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ProductId>,
) -> Result<Response> {
    let product = state.api().product(&id).await?;

    let max_choice = product
        .stock
        .map_or(MAX_QUANTITY_CHOICE, |stock| stock.min(MAX_QUANTITY_CHOICE));

    Ok(ProductShowTemplate {
        page: PageContext::load(&session).await,
        product: ProductCard::from(&product),
        description: product.description.clone(),
        stock_label: stock_label(product.stock),
        quantity_choices: (1..=max_choice).collect(),
        reviews: product
            .reviews
            .iter()
            .rev()
            .map(|review| ReviewView {
                name: review.name.clone(),
                rating: review.rating,
                comment: review.comment.clone(),
                date: format_date(review.created_at),
            })
            .collect(),
    }
    .into_response())
}

// =============================================================================
// Reviews
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ReviewForm {
    pub rating: String,
    pub comment: String,
}

/// Validate a review form into a 1-5 rating and a trimmed comment.
fn validate_review(form: &ReviewForm) -> std::result::Result<(u8, &str), &'static str> {
    let rating = form
        .rating
        .trim()
        .parse::<u8>()
        .ok()
        .filter(|r| (1..=5).contains(r))
        .ok_or("Selecciona una calificación entre 1 y 5.")?;
    let comment = form.comment.trim();
    if comment.is_empty() {
        return Err("Escribe un comentario.");
    }
    Ok((rating, comment))
}

/// Add a review to a product.
#[instrument(skip(state, session, auth, form), fields(product_id = %id))]
pub async fn add_review(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<ProductId>,
    Form(form): Form<ReviewForm>,
) -> Result<Response> {
    let back = format!("/producto/{}", urlencoding::encode(id.as_str()));

    match validate_review(&form) {
        Err(message) => Flash::error(&session, message).await,
        Ok((rating, comment)) => {
            match state
                .api()
                .add_review(&auth.token, &id, rating, comment)
                .await
            {
                Ok(()) => {
                    tracing::info!(rating, "Review added");
                    Flash::success(&session, "¡Gracias por tu reseña!").await;
                }
                Err(e) => flash_api_error(&session, e).await?,
            }
        }
    }

    Ok(Redirect::to(&back).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shop_query_ignores_blank_filters() {
        let shop = ShopQuery {
            categoria: Some(String::new()),
            buscar: Some("  mouse ".to_string()),
            orden: Some("popular".to_string()),
            pagina: Some("1".to_string()),
        };
        let query = shop.to_api_query();
        assert_eq!(query.category, None);
        assert_eq!(query.search.as_deref(), Some("mouse"));
        assert_eq!(query.sort, None);
        assert_eq!(query.page, None);
    }

    #[test]
    fn test_page_url_keeps_filters() {
        let query = ProductQuery {
            category: CategoryId::parse("c1").ok(),
            search: Some("mouse gamer".to_string()),
            sort: Some(ProductSort::PriceAsc),
            page: Some(2),
        };
        assert_eq!(
            page_url(&query, 3),
            "/tienda?categoria=c1&buscar=mouse+gamer&orden=price-asc&pagina=3"
        );
        assert_eq!(page_url(&ProductQuery::default(), 1), "/tienda");
    }

    #[test]
    fn test_validate_review() {
        let form = ReviewForm {
            rating: "5".to_string(),
            comment: " Excelente ".to_string(),
        };
        assert_eq!(validate_review(&form), Ok((5, "Excelente")));

        let form = ReviewForm {
            rating: "0".to_string(),
            comment: "x".to_string(),
        };
        assert!(validate_review(&form).is_err());

        let form = ReviewForm {
            rating: "4".to_string(),
            comment: "   ".to_string(),
        };
        assert_eq!(validate_review(&form), Err("Escribe un comentario."));
    }

    #[test]
    fn test_stock_label() {
        assert_eq!(stock_label(Some(0)), "Agotado");
        assert_eq!(stock_label(Some(3)), "Solo quedan 3 unidades");
        assert_eq!(stock_label(None), "Disponible");
    }
}
