//! Checkout route handlers.
//!
//! Checkout is a linear flow (sign in, shipping, payment, place order). Each
//! step checks its prerequisites with [`CheckoutProgress`] and sends the
//! visitor back to the first missing one.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use bestdeal_core::{
    AuthSession, Cart, CheckoutBlock, CheckoutProgress, CheckoutStep, PaymentMethod,
    ShippingAddress,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::api::{NewOrder, OrderItem};
use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{OptionalAuth, RequireAuth, login_redirect_url};
use crate::models::Flash;
use crate::models::session::{load_cart, save_cart};
use crate::state::AppState;
use crate::views::{CartView, PageContext};

use super::flash_api_error;

/// Checkout progress bar entry.
#[derive(Clone)]
pub struct StepView {
    pub label: &'static str,
    pub reached: bool,
    pub current: bool,
}

fn step_views(progress: &CheckoutProgress, current: CheckoutStep) -> Vec<StepView> {
    CheckoutStep::ALL
        .into_iter()
        .map(|step| StepView {
            label: step.label(),
            reached: progress.reached(step),
            current: step == current,
        })
        .collect()
}

/// Where to send a visitor who cannot enter a step yet.
async fn blocked(session: &Session, block: CheckoutBlock, step_path: &str) -> Response {
    match block {
        CheckoutBlock::SignIn => Redirect::to(&login_redirect_url(step_path)).into_response(),
        CheckoutBlock::Shipping => {
            Flash::info(session, "Primero ingresa tu dirección de envío.").await;
            Redirect::to("/envio").into_response()
        }
        CheckoutBlock::EmptyCart => {
            Flash::info(session, "Tu carrito está vacío.").await;
            Redirect::to("/carrito").into_response()
        }
    }
}

/// Load the cart and check the prerequisites of `step`.
async fn enter_step(
    session: &Session,
    auth: &AuthSession,
    step: CheckoutStep,
    step_path: &str,
) -> Result<std::result::Result<(Cart, CheckoutProgress), Response>> {
    let cart = load_cart(session).await?;
    let progress = CheckoutProgress::evaluate(Some(auth), &cart);
    match progress.require(step) {
        Ok(()) => Ok(Ok((cart, progress))),
        Err(block) => Ok(Err(blocked(session, block, step_path).await)),
    }
}

// =============================================================================
// Entry
// =============================================================================

/// "Proceed to checkout" from the cart page.
#[instrument(skip(session, auth))]
pub async fn start(session: Session, OptionalAuth(auth): OptionalAuth) -> Result<Response> {
    let cart = load_cart(&session).await?;
    if cart.is_empty() {
        return Ok(blocked(&session, CheckoutBlock::EmptyCart, "/envio").await);
    }
    let progress = CheckoutProgress::evaluate(auth.as_ref(), &cart);
    if let Err(block) = progress.require(CheckoutStep::Shipping) {
        return Ok(blocked(&session, block, "/envio").await);
    }
    Ok(Redirect::to("/envio").into_response())
}

// =============================================================================
// Shipping
// =============================================================================

/// Shipping address form template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/shipping.html")]
pub struct ShippingTemplate {
    pub page: PageContext,
    pub steps: Vec<StepView>,
    pub address: ShippingAddress,
    pub missing: Vec<&'static str>,
}

impl ShippingTemplate {
    /// Whether a field failed validation, for the template.
    fn is_missing(&self, field: &str) -> bool {
        self.missing.contains(&field)
    }
}

/// Display the shipping address form, prefilled with the saved address.
#[instrument(skip(session, auth))]
pub async fn shipping_page(session: Session, RequireAuth(auth): RequireAuth) -> Result<Response> {
    let (cart, progress) = match enter_step(&session, &auth, CheckoutStep::Shipping, "/envio").await? {
        Ok(entered) => entered,
        Err(redirect) => return Ok(redirect),
    };

    Ok(ShippingTemplate {
        page: PageContext::load(&session).await,
        steps: step_views(&progress, CheckoutStep::Shipping),
        address: cart.shipping_address().cloned().unwrap_or_default(),
        missing: Vec::new(),
    }
    .into_response())
}

/// Validate and save the shipping address.
#[instrument(skip(session, auth, address))]
pub async fn save_shipping(
    session: Session,
    RequireAuth(auth): RequireAuth,
    Form(address): Form<ShippingAddress>,
) -> Result<Response> {
    let mut cart = load_cart(&session).await?;

    match address.clone().validate() {
        Ok(address) => {
            cart.save_shipping_address(address);
            save_cart(&session, &cart).await?;
            Ok(Redirect::to("/pago").into_response())
        }
        Err(missing) => {
            let progress = CheckoutProgress::evaluate(Some(&auth), &cart);
            let mut page = PageContext::load(&session).await;
            page.flashes.push(Flash {
                kind: crate::models::FlashKind::Error,
                message: "Completa todos los campos de envío.".to_string(),
            });
            Ok((
                StatusCode::UNPROCESSABLE_ENTITY,
                ShippingTemplate {
                    page,
                    steps: step_views(&progress, CheckoutStep::Shipping),
                    address,
                    missing,
                },
            )
                .into_response())
        }
    }
}

// =============================================================================
// Payment
// =============================================================================

#[derive(Clone)]
pub struct PaymentOption {
    pub value: &'static str,
    pub selected: bool,
}

/// Payment method template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/payment.html")]
pub struct PaymentTemplate {
    pub page: PageContext,
    pub steps: Vec<StepView>,
    pub options: Vec<PaymentOption>,
}

/// Display the payment method choice.
#[instrument(skip(session, auth))]
pub async fn payment_page(session: Session, RequireAuth(auth): RequireAuth) -> Result<Response> {
    let (cart, progress) = match enter_step(&session, &auth, CheckoutStep::Payment, "/pago").await? {
        Ok(entered) => entered,
        Err(redirect) => return Ok(redirect),
    };

    Ok(PaymentTemplate {
        page: PageContext::load(&session).await,
        steps: step_views(&progress, CheckoutStep::Payment),
        options: PaymentMethod::ALL
            .into_iter()
            .map(|method| PaymentOption {
                value: method.label(),
                selected: method == cart.payment_method(),
            })
            .collect(),
    }
    .into_response())
}

#[derive(Debug, Deserialize)]
pub struct PaymentForm {
    pub payment_method: String,
}

/// Save the payment method.
#[instrument(skip(session, auth))]
pub async fn save_payment(
    session: Session,
    RequireAuth(auth): RequireAuth,
    Form(form): Form<PaymentForm>,
) -> Result<Response> {
    let (mut cart, _) = match enter_step(&session, &auth, CheckoutStep::Payment, "/pago").await? {
        Ok(entered) => entered,
        Err(redirect) => return Ok(redirect),
    };

    let Ok(method) = form.payment_method.parse::<PaymentMethod>() else {
        Flash::error(&session, "Selecciona un método de pago válido.").await;
        return Ok(Redirect::to("/pago").into_response());
    };

    cart.save_payment_method(method);
    save_cart(&session, &cart).await?;
    Ok(Redirect::to("/realizar-pedido").into_response())
}

// =============================================================================
// Review and place order
// =============================================================================

/// Order review template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/review.html")]
pub struct ReviewTemplate {
    pub page: PageContext,
    pub steps: Vec<StepView>,
    pub cart: CartView,
    pub address: ShippingAddress,
    pub payment_method: &'static str,
}

/// Display the order for a last review.
#[instrument(skip(session, auth))]
pub async fn review_page(session: Session, RequireAuth(auth): RequireAuth) -> Result<Response> {
    let (cart, progress) =
        match enter_step(&session, &auth, CheckoutStep::PlaceOrder, "/realizar-pedido").await? {
            Ok(entered) => entered,
            Err(redirect) => return Ok(redirect),
        };

    Ok(ReviewTemplate {
        page: PageContext::load(&session).await,
        steps: step_views(&progress, CheckoutStep::PlaceOrder),
        cart: CartView::from(&cart),
        address: cart.shipping_address().cloned().unwrap_or_default(),
        payment_method: cart.payment_method().label(),
    }
    .into_response())
}

/// Place the order and empty the cart.
///
/// The shipping address and payment method stay in the cart for the next
/// order.
#[instrument(skip(state, session, auth), fields(user_id = %auth.user.id))]
pub async fn place_order(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
) -> Result<Response> {
    let (mut cart, _) =
        match enter_step(&session, &auth, CheckoutStep::PlaceOrder, "/realizar-pedido").await? {
            Ok(entered) => entered,
            Err(redirect) => return Ok(redirect),
        };
    let Some(address) = cart.shipping_address().cloned() else {
        return Ok(blocked(&session, CheckoutBlock::Shipping, "/realizar-pedido").await);
    };

    let totals = cart.totals();
    let new_order = NewOrder {
        order_items: cart.items().iter().map(OrderItem::from).collect(),
        shipping_address: &address,
        payment_method: cart.payment_method(),
        total_price: totals.total_price,
    };

    match state.api().place_order(&auth.token, &new_order).await {
        Ok(order) => {
            cart.clear_cart();
            save_cart(&session, &cart).await?;
            add_breadcrumb("checkout", "Order placed", Some(&[("order_id", order.id.as_str())]));
            tracing::info!(order_id = %order.id, total = %totals.total_price, "Order placed");
            Flash::success(&session, "¡Pedido realizado con éxito!").await;
            Ok(Redirect::to(&format!("/pedido/{}", urlencoding::encode(order.id.as_str())))
                .into_response())
        }
        Err(e) => {
            flash_api_error(&session, e).await?;
            Ok(Redirect::to("/realizar-pedido").into_response())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_step_views_mark_progress() {
        let auth: AuthSession = AuthSession::login(
            serde_json::from_value(serde_json::json!({
                "_id": "u1", "name": "Ana", "email": "ana@x.co", "token": "t",
            }))
            .unwrap(),
        );
        let cart = Cart::default();
        let progress = CheckoutProgress::evaluate(Some(&auth), &cart);

        let steps = step_views(&progress, CheckoutStep::Shipping);
        assert_eq!(steps.len(), 4);
        assert!(steps[0].reached && steps[1].reached);
        assert!(!steps[2].reached);
        assert!(steps[1].current && !steps[0].current);
    }
}
