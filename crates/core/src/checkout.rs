//! Checkout step gating.
//!
//! Checkout is a linear flow: sign in, shipping address, payment method,
//! review and place the order. Each step requires everything before it.

use crate::auth::AuthSession;
use crate::cart::Cart;

/// A step of the checkout flow, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CheckoutStep {
    SignIn,
    Shipping,
    Payment,
    PlaceOrder,
}

impl CheckoutStep {
    pub const ALL: [Self; 4] = [Self::SignIn, Self::Shipping, Self::Payment, Self::PlaceOrder];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::SignIn => "Iniciar sesión",
            Self::Shipping => "Envío",
            Self::Payment => "Pago",
            Self::PlaceOrder => "Realizar pedido",
        }
    }
}

/// Why a visitor cannot enter a checkout step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutBlock {
    /// Nobody is signed in.
    SignIn,
    /// No shipping address has been saved.
    Shipping,
    /// The cart has no items to order.
    EmptyCart,
}

/// What a visitor has completed so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutProgress {
    signed_in: bool,
    has_address: bool,
    has_items: bool,
}

impl CheckoutProgress {
    #[must_use]
    pub fn evaluate(auth: Option<&AuthSession>, cart: &Cart) -> Self {
        Self {
            signed_in: auth.is_some(),
            has_address: cart.shipping_address().is_some(),
            has_items: !cart.is_empty(),
        }
    }

    /// The furthest step the visitor may open.
    #[must_use]
    pub const fn furthest(&self) -> CheckoutStep {
        if !self.signed_in {
            CheckoutStep::SignIn
        } else if !self.has_address {
            CheckoutStep::Shipping
        } else if !self.has_items {
            CheckoutStep::Payment
        } else {
            CheckoutStep::PlaceOrder
        }
    }

    /// Whether `step` is reachable, for the step indicator.
    #[must_use]
    pub fn reached(&self, step: CheckoutStep) -> bool {
        step <= self.furthest()
    }

    /// Check the prerequisites of `step`.
    ///
    /// # Errors
    ///
    /// Returns the first missing prerequisite.
    pub const fn require(&self, step: CheckoutStep) -> Result<(), CheckoutBlock> {
        match step {
            CheckoutStep::SignIn => Ok(()),
            _ if !self.signed_in => Err(CheckoutBlock::SignIn),
            CheckoutStep::Shipping => Ok(()),
            _ if !self.has_address => Err(CheckoutBlock::Shipping),
            CheckoutStep::Payment => Ok(()),
            CheckoutStep::PlaceOrder if !self.has_items => Err(CheckoutBlock::EmptyCart),
            CheckoutStep::PlaceOrder => Ok(()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::auth::LoginResponse;
    use crate::cart::{CartProduct, ShippingAddress};
    use crate::types::{Money, ProductId};

    fn auth() -> AuthSession {
        let response: LoginResponse = serde_json::from_value(serde_json::json!({
            "_id": "u1", "name": "Ana", "email": "ana@x.co", "role": "user", "token": "t",
        }))
        .unwrap();
        AuthSession::login(response)
    }

    fn address() -> ShippingAddress {
        ShippingAddress {
            full_name: "Ana".into(),
            phone: "300".into(),
            address: "Calle 1".into(),
            city: "Bogotá".into(),
            postal_code: "110111".into(),
            country: "Colombia".into(),
        }
    }

    fn product() -> CartProduct {
        CartProduct {
            id: ProductId::parse("p1").unwrap(),
            name: "Teclado".into(),
            image: None,
            brand: None,
            price: Money::from_units(50),
            stock: None,
        }
    }

    #[test]
    fn test_anonymous_is_sent_to_sign_in() {
        let progress = CheckoutProgress::evaluate(None, &Cart::new());
        assert_eq!(progress.furthest(), CheckoutStep::SignIn);
        assert_eq!(progress.require(CheckoutStep::SignIn), Ok(()));
        assert_eq!(
            progress.require(CheckoutStep::Shipping),
            Err(CheckoutBlock::SignIn)
        );
        assert_eq!(
            progress.require(CheckoutStep::PlaceOrder),
            Err(CheckoutBlock::SignIn)
        );
    }

    #[test]
    fn test_payment_needs_address() {
        let auth = auth();
        let mut cart = Cart::new();
        let progress = CheckoutProgress::evaluate(Some(&auth), &cart);
        assert_eq!(progress.require(CheckoutStep::Shipping), Ok(()));
        assert_eq!(
            progress.require(CheckoutStep::Payment),
            Err(CheckoutBlock::Shipping)
        );

        cart.save_shipping_address(address());
        let progress = CheckoutProgress::evaluate(Some(&auth), &cart);
        assert_eq!(progress.require(CheckoutStep::Payment), Ok(()));
        assert_eq!(
            progress.require(CheckoutStep::PlaceOrder),
            Err(CheckoutBlock::EmptyCart)
        );
    }

    #[test]
    fn test_complete_checkout_reaches_place_order() {
        let auth = auth();
        let mut cart = Cart::new();
        cart.save_shipping_address(address());
        cart.add_item(&product(), 1).unwrap();

        let progress = CheckoutProgress::evaluate(Some(&auth), &cart);
        assert_eq!(progress.furthest(), CheckoutStep::PlaceOrder);
        assert!(CheckoutStep::ALL.iter().all(|step| progress.reached(*step)));
        assert_eq!(progress.require(CheckoutStep::PlaceOrder), Ok(()));
    }
}
