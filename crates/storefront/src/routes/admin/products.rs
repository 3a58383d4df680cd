//! Admin product management: listing, create/edit forms, delete, and the
//! inline category and brand forms.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use bestdeal_core::{ApiToken, CategoryId, Money, Pagination, ProductId};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::api::{ApiError, Brand, Category, Product, ProductInput, ProductQuery};
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::models::Flash;
use crate::state::AppState;
use crate::views::{PageContext, ProductCard};

use super::super::products::PageLink;
use super::super::{flash_api_error, safe_redirect};
use super::form::MultipartForm;

// =============================================================================
// Listing
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct AdminProductsQuery {
    pub pagina: Option<u32>,
    pub buscar: Option<String>,
}

/// Product list template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/products/index.html")]
pub struct ProductListTemplate {
    pub page: PageContext,
    pub products: Vec<ProductCard>,
    pub search: String,
    pub pages: Vec<PageLink>,
}

fn admin_page_url(search: Option<&str>, page: u32) -> String {
    let mut url = url::form_urlencoded::Serializer::new(String::new());
    if page > 1 {
        url.append_pair("pagina", &page.to_string());
    }
    if let Some(search) = search {
        url.append_pair("buscar", search);
    }
    let query_string = url.finish();
    if query_string.is_empty() {
        "/admin/productos".to_string()
    } else {
        format!("/admin/productos?{query_string}")
    }
}

/// List products, paged like the shop.
#[instrument(skip(state, session, _auth))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(_auth): RequireAdmin,
    Query(query): Query<AdminProductsQuery>,
) -> Result<Response> {
    let search = query
        .buscar
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let listing = state
        .api()
        .products(&ProductQuery {
            search: search.map(ToString::to_string),
            page: query.pagina.filter(|page| *page > 1),
            ..ProductQuery::default()
        })
        .await?;
    let pagination = Pagination::new(listing.page, listing.pages);

    Ok(ProductListTemplate {
        page: PageContext::load(&session).await,
        products: listing.products.iter().map(ProductCard::from).collect(),
        search: search.unwrap_or_default().to_string(),
        pages: if pagination.is_visible() {
            pagination
                .pages()
                .into_iter()
                .map(|number| PageLink {
                    number,
                    url: admin_page_url(search, number),
                    current: number == pagination.current(),
                })
                .collect()
        } else {
            Vec::new()
        },
    }
    .into_response())
}

/// Delete a product.
#[instrument(skip(state, session, auth), fields(product_id = %id))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(auth): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<Response> {
    match state.api().delete_product(&auth.token, &id).await {
        Ok(()) => {
            tracing::info!("Product deleted");
            Flash::success(&session, "Producto eliminado.").await;
        }
        Err(e) => flash_api_error(&session, e).await?,
    }
    Ok(Redirect::to("/admin/productos").into_response())
}

// =============================================================================
// Create / edit
// =============================================================================

/// Values shown in the product form, as typed.
#[derive(Debug, Clone, Default)]
pub struct ProductFields {
    pub name: String,
    pub brand: String,
    pub description: String,
    pub price: String,
    pub stock: String,
    pub category: String,
    pub image: String,
}

impl From<&Product> for ProductFields {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            brand: product.brand.clone().unwrap_or_default(),
            description: product.description.clone(),
            price: product.price.amount().to_string(),
            stock: product.stock.unwrap_or_default().to_string(),
            category: product
                .category_id()
                .map(ToString::to_string)
                .unwrap_or_default(),
            image: product.image.clone().unwrap_or_default(),
        }
    }
}

impl From<&MultipartForm> for ProductFields {
    fn from(form: &MultipartForm) -> Self {
        Self {
            name: form.text("name").to_string(),
            brand: form.text("brand").to_string(),
            description: form.text("description").to_string(),
            price: form.text("price").to_string(),
            stock: form.text("stock").to_string(),
            category: form.text("category").to_string(),
            image: form.text("image").to_string(),
        }
    }
}

impl ProductFields {
    fn from_input(input: &ProductInput) -> Self {
        Self {
            name: input.name.clone(),
            brand: input.brand.clone(),
            description: input.description.clone(),
            price: input.price.amount().to_string(),
            stock: input.stock.to_string(),
            category: input.category.to_string(),
            image: input.image.clone().unwrap_or_default(),
        }
    }

    /// Check the form and build the API body (without a new image).
    fn to_input(&self) -> std::result::Result<ProductInput, Vec<&'static str>> {
        let mut errors = Vec::new();
        if self.name.is_empty() {
            errors.push("El nombre es obligatorio.");
        }
        if self.brand.is_empty() {
            errors.push("Selecciona una marca.");
        }
        let price = self
            .price
            .replace(',', ".")
            .parse::<Money>()
            .ok()
            .filter(|price| !price.amount().is_sign_negative());
        if price.is_none() {
            errors.push("Ingresa un precio válido.");
        }
        let stock = self.stock.parse::<u32>().ok();
        if stock.is_none() {
            errors.push("Ingresa un stock válido.");
        }
        let category = CategoryId::parse(&self.category).ok();
        if category.is_none() {
            errors.push("Selecciona una categoría.");
        }

        match (price, stock, category) {
            (Some(price), Some(stock), Some(category)) if errors.is_empty() => Ok(ProductInput {
                name: self.name.clone(),
                brand: self.brand.clone(),
                description: self.description.clone(),
                price,
                stock,
                category,
                image: Some(self.image.clone()).filter(|url| !url.is_empty()),
            }),
            _ => Err(errors),
        }
    }
}

#[derive(Clone)]
pub struct NamedOption {
    pub id: String,
    pub name: String,
}

/// Product form template (new and edit).
#[derive(Template, WebTemplate)]
#[template(path = "admin/products/form.html")]
pub struct ProductFormTemplate {
    pub page: PageContext,
    pub title: &'static str,
    pub action: String,
    pub return_to: String,
    pub fields: ProductFields,
    pub errors: Vec<&'static str>,
    pub categories: Vec<NamedOption>,
    pub brands: Vec<NamedOption>,
    pub uploads_enabled: bool,
}

async fn form_options(state: &AppState) -> (Vec<NamedOption>, Vec<NamedOption>) {
    let (categories, brands) = tokio::join!(state.api().categories(), state.api().brands());
    let categories: Vec<Category> = categories.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load categories");
        Vec::new()
    });
    let brands: Vec<Brand> = brands.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load brands");
        Vec::new()
    });

    (
        categories
            .into_iter()
            .map(|c| NamedOption {
                id: c.id.to_string(),
                name: c.name,
            })
            .collect(),
        brands
            .into_iter()
            .map(|b| NamedOption {
                id: b.id.to_string(),
                name: b.name,
            })
            .collect(),
    )
}

async fn render_form(
    state: &AppState,
    session: &Session,
    product: Option<&ProductId>,
    fields: ProductFields,
    errors: Vec<&'static str>,
) -> ProductFormTemplate {
    let (categories, brands) = form_options(state).await;
    let (title, action, return_to) = match product {
        Some(id) => (
            "Editar producto",
            format!("/admin/productos/{id}"),
            format!("/admin/productos/editar/{id}"),
        ),
        None => (
            "Nuevo producto",
            "/admin/productos".to_string(),
            "/admin/productos/nuevo".to_string(),
        ),
    };

    ProductFormTemplate {
        page: PageContext::load(session).await,
        title,
        action,
        return_to,
        fields,
        errors,
        categories,
        brands,
        uploads_enabled: state.api().uploads_enabled(),
    }
}

/// Display the new product form.
#[instrument(skip(state, session, _auth))]
pub async fn new_page(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(_auth): RequireAdmin,
) -> impl IntoResponse {
    render_form(&state, &session, None, ProductFields::default(), Vec::new()).await
}

/// Display the edit form for a product.
#[instrument(skip(state, session, _auth), fields(product_id = %id))]
pub async fn edit_page(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(_auth): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<Response> {
    let product = state.api().product(&id).await?;
    let fields = ProductFields::from(&product);
    Ok(render_form(&state, &session, Some(&id), fields, Vec::new())
        .await
        .into_response())
}

/// Validate the form and upload the new image, if any.
///
/// An uploaded file wins over the image URL field.
async fn prepare_input(
    state: &AppState,
    token: &ApiToken,
    form: MultipartForm,
) -> std::result::Result<ProductInput, (ProductFields, Vec<&'static str>, Option<ApiError>)> {
    let fields = ProductFields::from(&form);
    let mut input = match fields.to_input() {
        Ok(input) => input,
        Err(errors) => return Err((fields, errors, None)),
    };

    if let Some(image) = form.image {
        match state.api().upload_image(token, image).await {
            Ok(url) => input.image = Some(url),
            Err(e) => return Err((fields, Vec::new(), Some(e))),
        }
    }
    Ok(input)
}

/// Re-render the form with errors, or flash an API failure.
async fn form_failure(
    state: &AppState,
    session: &Session,
    product: Option<&ProductId>,
    (fields, errors, api_error): (ProductFields, Vec<&'static str>, Option<ApiError>),
) -> Result<Response> {
    if let Some(e) = api_error {
        flash_api_error(session, e).await?;
    }
    Ok((
        StatusCode::UNPROCESSABLE_ENTITY,
        render_form(state, session, product, fields, errors).await,
    )
        .into_response())
}

/// Create a product.
#[instrument(skip(state, session, auth, multipart))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(auth): RequireAdmin,
    multipart: Multipart,
) -> Result<Response> {
    let form = MultipartForm::read(multipart).await?;
    let input = match prepare_input(&state, &auth.token, form).await {
        Ok(input) => input,
        Err(failure) => return form_failure(&state, &session, None, failure).await,
    };

    match state.api().create_product(&auth.token, &input).await {
        Ok(product) => {
            tracing::info!(product_id = %product.id, "Product created");
            Flash::success(&session, format!("Producto \"{}\" creado.", product.name)).await;
            Ok(Redirect::to("/admin/productos").into_response())
        }
        Err(e) => {
            let failure = (ProductFields::from_input(&input), Vec::new(), Some(e));
            form_failure(&state, &session, None, failure).await
        }
    }
}

/// Update a product.
#[instrument(skip(state, session, auth, multipart), fields(product_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(auth): RequireAdmin,
    Path(id): Path<ProductId>,
    multipart: Multipart,
) -> Result<Response> {
    let form = MultipartForm::read(multipart).await?;
    let input = match prepare_input(&state, &auth.token, form).await {
        Ok(input) => input,
        Err(failure) => return form_failure(&state, &session, Some(&id), failure).await,
    };

    match state.api().update_product(&auth.token, &id, &input).await {
        Ok(product) => {
            tracing::info!("Product updated");
            Flash::success(&session, format!("Producto \"{}\" actualizado.", product.name)).await;
            Ok(Redirect::to("/admin/productos").into_response())
        }
        Err(e) => {
            let failure = (ProductFields::from_input(&input), Vec::new(), Some(e));
            form_failure(&state, &session, Some(&id), failure).await
        }
    }
}

// =============================================================================
// Categories and brands
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct NameForm {
    pub name: String,
    #[serde(default)]
    pub return_to: Option<String>,
}

/// Back to the form the inline create was submitted from, if it is an admin
/// page.
fn admin_return_path(return_to: Option<&str>) -> &str {
    let path = safe_redirect(return_to);
    if path.starts_with("/admin") {
        path
    } else {
        "/admin/productos"
    }
}

/// Create a category from the product form.
#[instrument(skip(state, session, auth, form))]
pub async fn create_category(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(auth): RequireAdmin,
    Form(form): Form<NameForm>,
) -> Result<Response> {
    let back = admin_return_path(form.return_to.as_deref()).to_string();
    let name = form.name.trim();
    if name.is_empty() {
        Flash::error(&session, "Escribe el nombre de la categoría.").await;
        return Ok(Redirect::to(&back).into_response());
    }

    match state.api().create_category(&auth.token, name).await {
        Ok(category) => {
            Flash::success(&session, format!("Categoría \"{}\" creada.", category.name)).await;
        }
        Err(e) => flash_api_error(&session, e).await?,
    }
    Ok(Redirect::to(&back).into_response())
}

/// Create a brand from the product form.
#[instrument(skip(state, session, auth, form))]
pub async fn create_brand(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(auth): RequireAdmin,
    Form(form): Form<NameForm>,
) -> Result<Response> {
    let back = admin_return_path(form.return_to.as_deref()).to_string();
    let name = form.name.trim();
    if name.is_empty() {
        Flash::error(&session, "Escribe el nombre de la marca.").await;
        return Ok(Redirect::to(&back).into_response());
    }

    match state.api().create_brand(&auth.token, name).await {
        Ok(brand) => {
            Flash::success(&session, format!("Marca \"{}\" creada.", brand.name)).await;
        }
        Err(e) => flash_api_error(&session, e).await?,
    }
    Ok(Redirect::to(&back).into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn fields() -> ProductFields {
        ProductFields {
            name: "Teclado".to_string(),
            brand: "Redragon".to_string(),
            description: "Mecánico".to_string(),
            price: "129,90".to_string(),
            stock: "4".to_string(),
            category: "c1".to_string(),
            image: String::new(),
        }
    }

    #[test]
    fn test_valid_fields_build_input() {
        let input = fields().to_input().unwrap();
        assert_eq!(input.price.display(), "$129.90");
        assert_eq!(input.stock, 4);
        assert_eq!(input.category.as_str(), "c1");
        assert_eq!(input.image, None);
    }

    #[test]
    fn test_invalid_fields_list_every_error() {
        let fields = ProductFields {
            name: String::new(),
            price: "-3".to_string(),
            stock: "muchos".to_string(),
            category: String::new(),
            ..fields()
        };
        assert_eq!(
            fields.to_input().unwrap_err(),
            vec![
                "El nombre es obligatorio.",
                "Ingresa un precio válido.",
                "Ingresa un stock válido.",
                "Selecciona una categoría."
            ]
        );
    }

    #[test]
    fn test_admin_page_url() {
        assert_eq!(admin_page_url(None, 1), "/admin/productos");
        assert_eq!(
            admin_page_url(Some("mouse rgb"), 2),
            "/admin/productos?pagina=2&buscar=mouse+rgb"
        );
    }

    #[test]
    fn test_admin_return_path() {
        assert_eq!(
            admin_return_path(Some("/admin/productos/nuevo")),
            "/admin/productos/nuevo"
        );
        assert_eq!(admin_return_path(Some("/perfil")), "/admin/productos");
        assert_eq!(admin_return_path(Some("https://evil.test")), "/admin/productos");
        assert_eq!(admin_return_path(None), "/admin/productos");
    }
}
