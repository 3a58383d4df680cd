//! Cart route handlers.
//!
//! The cart lives in the visitor's session. Every mutation loads it, applies
//! the change through the cart store, saves it back, and redirects to the
//! cart page (post/redirect/get).

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use bestdeal_core::{CartError, ProductId};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::api::ApiError;
use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::models::Flash;
use crate::models::session::{load_cart, save_cart};
use crate::state::AppState;
use crate::views::{CartView, PageContext};

use super::flash_api_error;

const CART_PATH: &str = "/carrito";

/// Message shown when a cart mutation is refused.
pub(crate) fn cart_error_message(err: &CartError) -> String {
    match err {
        CartError::OutOfStock(name) => format!("{name} está agotado."),
        CartError::InsufficientStock { name, available } => {
            format!("Solo hay {available} unidades disponibles de {name}.")
        }
        CartError::QuantityLimit { name, max } => {
            format!("Puedes llevar hasta {max} unidades de {name} por pedido.")
        }
        CartError::NotInCart(_) => "Ese producto ya no está en tu carrito.".to_string(),
    }
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub page: PageContext,
    pub cart: CartView,
}

/// Display the cart page.
#[instrument(skip(session))]
pub async fn show(session: Session) -> Result<Response> {
    let cart = load_cart(&session).await?;

    Ok(CartShowTemplate {
        page: PageContext::load(&session).await,
        cart: CartView::from(&cart),
    }
    .into_response())
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: ProductId,
    pub quantity: Option<u32>,
}

/// Add a product to the cart, merging with an existing line.
///
/// The product is fetched so price and stock come from the backend rather
/// than the form.
#[instrument(skip(state, session), fields(product_id = %form.product_id))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let product = match state.api().product(&form.product_id).await {
        Ok(product) => product,
        Err(ApiError::NotFound(_)) => {
            Flash::error(&session, "Ese producto ya no está disponible.").await;
            return Ok(Redirect::to(CART_PATH).into_response());
        }
        Err(e) => {
            flash_api_error(&session, e).await?;
            return Ok(Redirect::to(CART_PATH).into_response());
        }
    };

    let mut cart = load_cart(&session).await?;
    let quantity = form.quantity.unwrap_or(1);
    match cart.add_item(&product.to_cart_product(), quantity) {
        Ok(()) => {
            save_cart(&session, &cart).await?;
            add_breadcrumb(
                "cart",
                "Added product",
                Some(&[("product_id", product.id.as_str())]),
            );
            tracing::info!(quantity, "Product added to cart");
            Flash::success(&session, format!("{} se agregó al carrito.", product.name)).await;
        }
        Err(e) => {
            tracing::info!(error = %e, "Add to cart refused");
            Flash::error(&session, cart_error_message(&e)).await;
        }
    }

    Ok(Redirect::to(CART_PATH).into_response())
}

/// Add one unit to a line.
#[instrument(skip(session), fields(product_id = %id))]
pub async fn increase(session: Session, Path(id): Path<ProductId>) -> Result<Response> {
    let mut cart = load_cart(&session).await?;
    match cart.increase_quantity(&id) {
        Ok(()) => save_cart(&session, &cart).await?,
        Err(e) => Flash::error(&session, cart_error_message(&e)).await,
    }
    Ok(Redirect::to(CART_PATH).into_response())
}

/// Take one unit off a line; a line never drops below one unit.
#[instrument(skip(session), fields(product_id = %id))]
pub async fn decrease(session: Session, Path(id): Path<ProductId>) -> Result<Response> {
    let mut cart = load_cart(&session).await?;
    if cart.decrease_quantity(&id) {
        save_cart(&session, &cart).await?;
    }
    Ok(Redirect::to(CART_PATH).into_response())
}

/// Remove a line from the cart.
#[instrument(skip(session), fields(product_id = %id))]
pub async fn remove(session: Session, Path(id): Path<ProductId>) -> Result<Response> {
    let mut cart = load_cart(&session).await?;
    if cart.remove_item(&id) {
        save_cart(&session, &cart).await?;
        Flash::info(&session, "Producto eliminado del carrito.").await;
    }
    Ok(Redirect::to(CART_PATH).into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode},
        routing::post,
    };
    use bestdeal_core::{Cart, CartProduct, Money};
    use tower::ServiceExt;
    use tower_sessions::{MemoryStore, SessionManagerLayer};

    use super::*;

    #[test]
    fn test_cart_error_messages() {
        let err = CartError::InsufficientStock {
            name: "Mouse".to_string(),
            available: 2,
        };
        assert_eq!(
            cart_error_message(&err),
            "Solo hay 2 unidades disponibles de Mouse."
        );
        assert_eq!(
            cart_error_message(&CartError::OutOfStock("Teclado".to_string())),
            "Teclado está agotado."
        );
        assert_eq!(
            cart_error_message(&CartError::QuantityLimit {
                name: "Mouse".to_string(),
                max: 99,
            }),
            "Puedes llevar hasta 99 unidades de Mouse por pedido."
        );
    }

    /// Seeds a cart, then applies `path` and reports the resulting quantity.
    async fn quantity_after(path: &'static str) -> Option<u32> {
        async fn seed(session: Session) -> Result<Response> {
            let mut cart = Cart::default();
            cart.add_item(
                &CartProduct {
                    id: ProductId::parse("p1").unwrap(),
                    name: "Mouse".into(),
                    image: None,
                    brand: None,
                    price: Money::from_units(10),
                    stock: Some(3),
                },
                1,
            )
            .unwrap();
            save_cart(&session, &cart).await?;
            Ok(Redirect::to(CART_PATH).into_response())
        }

        async fn inspect(session: Session) -> String {
            let cart = load_cart(&session).await.unwrap();
            cart.items()
                .first()
                .map(|item| item.quantity.to_string())
                .unwrap_or_default()
        }

        let app = Router::new()
            .route("/seed", post(seed))
            .route("/carrito/{id}/aumentar", post(increase))
            .route("/carrito/{id}/disminuir", post(decrease))
            .route("/carrito/{id}/eliminar", post(remove))
            .route("/inspect", post(inspect))
            .layer(SessionManagerLayer::new(MemoryStore::default()));

        let response = app
            .clone()
            .oneshot(Request::post("/seed").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let cookie = response.headers()["set-cookie"].to_str().unwrap().to_string();
        let cookie = cookie.split(';').next().unwrap().to_string();

        let response = app
            .clone()
            .oneshot(
                Request::post(path)
                    .header("cookie", &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], CART_PATH);

        let response = app
            .oneshot(
                Request::post("/inspect")
                    .header("cookie", &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(body.to_vec()).unwrap().parse().ok()
    }

    #[tokio::test]
    async fn test_increase_adds_a_unit() {
        assert_eq!(quantity_after("/carrito/p1/aumentar").await, Some(2));
    }

    #[tokio::test]
    async fn test_decrease_floors_at_one() {
        assert_eq!(quantity_after("/carrito/p1/disminuir").await, Some(1));
    }

    #[tokio::test]
    async fn test_remove_drops_the_line() {
        assert_eq!(quantity_after("/carrito/p1/eliminar").await, None);
    }
}
