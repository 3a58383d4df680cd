//! Session-stored visitor state.
//!
//! The cart and auth stores from `bestdeal_core` are plain values; these
//! helpers read them from and write them back to the visitor's session after
//! every mutation.

use bestdeal_core::{AuthSession, Cart};
use tower_sessions::Session;

/// Session keys.
pub mod keys {
    /// Key for the signed-in user and bearer token.
    pub const AUTH: &str = "auth";

    /// Key for the cart store (items, shipping address, payment method).
    pub const CART: &str = "cart";

    /// Key for pending flash messages.
    pub const FLASH: &str = "flash";
}

/// Load the cart, or an empty one for new visitors.
///
/// A cart that no longer deserializes (e.g. after a format change) is
/// treated as empty rather than failing the request.
///
/// # Errors
///
/// Returns an error if the session store is unavailable.
pub async fn load_cart(session: &Session) -> Result<Cart, tower_sessions::session::Error> {
    match session.get::<Cart>(keys::CART).await {
        Ok(cart) => Ok(cart.unwrap_or_default()),
        Err(tower_sessions::session::Error::SerdeJson(e)) => {
            tracing::warn!(error = %e, "Discarding unreadable cart from session");
            Ok(Cart::default())
        }
        Err(e) => Err(e),
    }
}

/// Persist the cart.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn save_cart(session: &Session, cart: &Cart) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::CART, cart).await
}

/// The signed-in visitor, if any.
pub async fn current_auth(session: &Session) -> Option<AuthSession> {
    session.get::<AuthSession>(keys::AUTH).await.ok().flatten()
}

/// Store the auth session after login or registration.
///
/// The session id is cycled first so a pre-login id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_auth(
    session: &Session,
    auth: &AuthSession,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(keys::AUTH, auth).await
}

/// Drop the auth session (logout). The cart is kept.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_auth(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<AuthSession>(keys::AUTH).await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use bestdeal_core::{CartProduct, Money, ProductId};
    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_cart_round_trip() {
        let session = session();
        assert!(load_cart(&session).await.unwrap().is_empty());

        let mut cart = Cart::new();
        cart.add_item(
            &CartProduct {
                id: ProductId::parse("p1").unwrap(),
                name: "Audífonos".into(),
                image: None,
                brand: None,
                price: Money::from_units(80),
                stock: Some(4),
            },
            2,
        )
        .unwrap();
        save_cart(&session, &cart).await.unwrap();

        assert_eq!(load_cart(&session).await.unwrap(), cart);
    }

    #[tokio::test]
    async fn test_unreadable_cart_is_empty() {
        let session = session();
        session.insert(keys::CART, "not a cart").await.unwrap();
        assert!(load_cart(&session).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_auth_absent_by_default() {
        let session = session();
        assert!(current_auth(&session).await.is_none());
        clear_auth(&session).await.unwrap();
    }
}
