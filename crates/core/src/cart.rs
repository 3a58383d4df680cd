//! The cart store.
//!
//! A cart holds the visitor's line items, the shipping address entered during
//! checkout and the selected payment method. Every operation is a synchronous
//! in-memory mutation; the caller persists the whole value afterwards.
//!
//! Invariants:
//! - every line item has `quantity >= 1`
//! - at most one line item per product id
//! - line items keep insertion order

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Money, PaymentMethod, ProductId};

/// Items above this subtotal ship for free.
pub const FREE_SHIPPING_THRESHOLD: Money = Money::new(Decimal::ONE_HUNDRED);

/// Flat shipping fee below the threshold.
pub const SHIPPING_FEE: Money = Money::new(Decimal::TEN);

/// Sales tax rate applied to the items subtotal (15 %).
pub const TAX_RATE: Decimal = Decimal::from_parts(15, 0, 0, false, 2);

/// Most units of one product a single line may hold.
pub const MAX_LINE_QUANTITY: u32 = 99;

/// Errors from cart mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CartError {
    #[error("{0} is out of stock")]
    OutOfStock(String),
    #[error("only {available} units of {name} are available")]
    InsufficientStock { name: String, available: u32 },
    #[error("at most {max} units of {name} per order")]
    QuantityLimit { name: String, max: u32 },
    #[error("product {0} is not in the cart")]
    NotInCart(ProductId),
}

/// The product fields the cart needs when adding an item.
///
/// Built by the caller from whatever product representation it has; the
/// cart never talks to the API itself.
#[derive(Debug, Clone, PartialEq)]
pub struct CartProduct {
    pub id: ProductId,
    pub name: String,
    pub image: Option<String>,
    pub brand: Option<String>,
    pub price: Money,
    /// Units in stock, when known.
    pub stock: Option<u32>,
}

/// A line item in the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product: ProductId,
    pub name: String,
    pub image: Option<String>,
    pub brand: Option<String>,
    pub price: Money,
    pub quantity: u32,
    #[serde(default)]
    pub stock: Option<u32>,
}

impl CartItem {
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.price * self.quantity
    }
}

/// Shipping address collected in the first checkout step.
///
/// Missing fields deserialize as empty so older orders still load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShippingAddress {
    pub full_name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

impl ShippingAddress {
    /// Trim every field and check none is blank.
    ///
    /// # Errors
    ///
    /// Returns the names of the missing fields, in form order.
    pub fn validate(self) -> Result<Self, Vec<&'static str>> {
        let address = Self {
            full_name: self.full_name.trim().to_owned(),
            phone: self.phone.trim().to_owned(),
            address: self.address.trim().to_owned(),
            city: self.city.trim().to_owned(),
            postal_code: self.postal_code.trim().to_owned(),
            country: self.country.trim().to_owned(),
        };

        let missing: Vec<&'static str> = [
            ("fullName", &address.full_name),
            ("phone", &address.phone),
            ("address", &address.address),
            ("city", &address.city),
            ("postalCode", &address.postal_code),
            ("country", &address.country),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(address)
        } else {
            Err(missing)
        }
    }

    /// Single-line rendering used on the review and order pages.
    #[must_use]
    pub fn one_line(&self) -> String {
        format!(
            "{}, {}, {}, {}",
            self.address, self.city, self.postal_code, self.country
        )
    }
}

/// Price breakdown shown on the review step and sent with the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartTotals {
    pub items_price: Money,
    pub shipping_price: Money,
    pub tax_price: Money,
    pub total_price: Money,
}

impl CartTotals {
    /// Compute totals for an items subtotal.
    #[must_use]
    pub fn for_items_price(items_price: Money) -> Self {
        let shipping_price = if items_price > FREE_SHIPPING_THRESHOLD {
            Money::ZERO
        } else {
            SHIPPING_FEE
        };
        let tax_price = items_price.percent(TAX_RATE).round_cents();

        Self {
            items_price,
            shipping_price,
            tax_price,
            total_price: items_price + shipping_price + tax_price,
        }
    }
}

/// The cart store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    #[serde(default)]
    items: Vec<CartItem>,
    #[serde(default)]
    shipping_address: Option<ShippingAddress>,
    #[serde(default)]
    payment_method: PaymentMethod,
}

impl Cart {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub const fn shipping_address(&self) -> Option<&ShippingAddress> {
        self.shipping_address.as_ref()
    }

    #[must_use]
    pub const fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total units across all line items.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    #[must_use]
    pub fn items_price(&self) -> Money {
        self.items.iter().map(CartItem::line_total).sum()
    }

    #[must_use]
    pub fn totals(&self) -> CartTotals {
        CartTotals::for_items_price(self.items_price())
    }

    fn position(&self, id: &ProductId) -> Option<usize> {
        self.items.iter().position(|item| &item.product == id)
    }

    /// Add `quantity` units of a product, merging with an existing line.
    ///
    /// A quantity of zero adds one unit. Display fields and price are
    /// refreshed from `product` when the line already exists.
    ///
    /// # Errors
    ///
    /// Fails when the product has no stock, or when the merged quantity would
    /// exceed the known stock.
    pub fn add_item(&mut self, product: &CartProduct, quantity: u32) -> Result<(), CartError> {
        let quantity = quantity.max(1);
        if product.stock == Some(0) {
            return Err(CartError::OutOfStock(product.name.clone()));
        }

        let existing = self
            .position(&product.id)
            .and_then(|index| self.items.get(index))
            .map_or(0, |item| item.quantity);
        let wanted = existing.saturating_add(quantity);
        if wanted > MAX_LINE_QUANTITY {
            return Err(CartError::QuantityLimit {
                name: product.name.clone(),
                max: MAX_LINE_QUANTITY,
            });
        }
        if let Some(available) = product.stock
            && wanted > available
        {
            return Err(CartError::InsufficientStock {
                name: product.name.clone(),
                available,
            });
        }

        let line = CartItem {
            product: product.id.clone(),
            name: product.name.clone(),
            image: product.image.clone(),
            brand: product.brand.clone(),
            price: product.price,
            quantity: wanted,
            stock: product.stock,
        };

        match self.position(&product.id) {
            Some(index) => {
                if let Some(slot) = self.items.get_mut(index) {
                    *slot = line;
                }
            }
            None => self.items.push(line),
        }
        Ok(())
    }

    /// Remove a line item. Returns whether a line was removed.
    pub fn remove_item(&mut self, id: &ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| &item.product != id);
        self.items.len() != before
    }

    /// Add one unit to a line item.
    ///
    /// # Errors
    ///
    /// Fails when the product is not in the cart or the known stock is
    /// already reached.
    pub fn increase_quantity(&mut self, id: &ProductId) -> Result<(), CartError> {
        let item = self
            .items
            .iter_mut()
            .find(|item| &item.product == id)
            .ok_or_else(|| CartError::NotInCart(id.clone()))?;

        if let Some(available) = item.stock
            && item.quantity >= available
        {
            return Err(CartError::InsufficientStock {
                name: item.name.clone(),
                available,
            });
        }
        item.quantity = item
            .quantity
            .checked_add(1)
            .filter(|quantity| *quantity <= MAX_LINE_QUANTITY)
            .ok_or_else(|| CartError::QuantityLimit {
                name: item.name.clone(),
                max: MAX_LINE_QUANTITY,
            })?;
        Ok(())
    }

    /// Take one unit off a line item, never going below one.
    ///
    /// Returns whether the quantity changed. Removing a line is always an
    /// explicit [`Cart::remove_item`].
    pub fn decrease_quantity(&mut self, id: &ProductId) -> bool {
        match self.items.iter_mut().find(|item| &item.product == id) {
            Some(item) if item.quantity > 1 => {
                item.quantity -= 1;
                true
            }
            _ => false,
        }
    }

    pub fn save_shipping_address(&mut self, address: ShippingAddress) {
        self.shipping_address = Some(address);
    }

    pub const fn save_payment_method(&mut self, method: PaymentMethod) {
        self.payment_method = method;
    }

    /// Empty the line items after an order is placed.
    ///
    /// The shipping address and payment method are kept for the next order.
    pub fn clear_cart(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(id: &str, price: &str, stock: Option<u32>) -> CartProduct {
        CartProduct {
            id: ProductId::parse(id).unwrap(),
            name: format!("Producto {id}"),
            image: None,
            brand: Some("Logitech".to_string()),
            price: price.parse().unwrap(),
            stock,
        }
    }

    fn pid(id: &str) -> ProductId {
        ProductId::parse(id).unwrap()
    }

    #[test]
    fn test_add_merges_by_product() {
        let mut cart = Cart::new();
        cart.add_item(&product("a", "10", None), 1).unwrap();
        cart.add_item(&product("b", "5", None), 2).unwrap();
        cart.add_item(&product("a", "10", None), 3).unwrap();

        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.items()[0].quantity, 4);
        assert_eq!(cart.items()[1].quantity, 2);
        assert_eq!(cart.item_count(), 6);
    }

    #[test]
    fn test_add_zero_quantity_adds_one() {
        let mut cart = Cart::new();
        cart.add_item(&product("a", "10", None), 0).unwrap();
        assert_eq!(cart.items()[0].quantity, 1);
    }

    #[test]
    fn test_add_refreshes_price() {
        let mut cart = Cart::new();
        cart.add_item(&product("a", "10", None), 1).unwrap();
        cart.add_item(&product("a", "12.5", None), 1).unwrap();
        assert_eq!(cart.items()[0].price, "12.5".parse().unwrap());
    }

    #[test]
    fn test_add_respects_stock() {
        let mut cart = Cart::new();
        assert_eq!(
            cart.add_item(&product("a", "10", Some(0)), 1),
            Err(CartError::OutOfStock("Producto a".to_string()))
        );
        cart.add_item(&product("b", "10", Some(2)), 2).unwrap();
        assert!(matches!(
            cart.add_item(&product("b", "10", Some(2)), 1),
            Err(CartError::InsufficientStock { available: 2, .. })
        ));
        assert_eq!(cart.items()[0].quantity, 2);
    }

    #[test]
    fn test_line_quantity_is_capped() {
        let mut cart = Cart::new();
        assert!(matches!(
            cart.add_item(&product("a", "10", None), u32::MAX),
            Err(CartError::QuantityLimit { max: MAX_LINE_QUANTITY, .. })
        ));
        assert!(cart.is_empty());

        cart.add_item(&product("a", "10", None), MAX_LINE_QUANTITY).unwrap();
        assert!(matches!(
            cart.increase_quantity(&pid("a")),
            Err(CartError::QuantityLimit { .. })
        ));
        assert_eq!(cart.items()[0].quantity, MAX_LINE_QUANTITY);
    }

    #[test]
    fn test_increase_never_wraps() {
        let mut cart: Cart = serde_json::from_value(serde_json::json!({
            "items": [{
                "product": "a",
                "name": "Producto a",
                "image": null,
                "brand": null,
                "price": "10",
                "quantity": u32::MAX,
                "stock": null
            }]
        }))
        .unwrap();
        assert!(cart.increase_quantity(&pid("a")).is_err());
        assert_eq!(cart.items()[0].quantity, u32::MAX);
    }

    #[test]
    fn test_increase_and_decrease() {
        let mut cart = Cart::new();
        cart.add_item(&product("a", "10", Some(3)), 1).unwrap();

        cart.increase_quantity(&pid("a")).unwrap();
        cart.increase_quantity(&pid("a")).unwrap();
        assert!(cart.increase_quantity(&pid("a")).is_err());
        assert_eq!(cart.items()[0].quantity, 3);

        assert!(cart.decrease_quantity(&pid("a")));
        assert!(cart.decrease_quantity(&pid("a")));
        assert!(!cart.decrease_quantity(&pid("a")));
        assert_eq!(cart.items()[0].quantity, 1);

        assert!(matches!(
            cart.increase_quantity(&pid("zzz")),
            Err(CartError::NotInCart(_))
        ));
        assert!(!cart.decrease_quantity(&pid("zzz")));
    }

    #[test]
    fn test_remove_item() {
        let mut cart = Cart::new();
        cart.add_item(&product("a", "10", None), 1).unwrap();
        assert!(cart.remove_item(&pid("a")));
        assert!(!cart.remove_item(&pid("a")));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_totals_below_free_shipping() {
        let mut cart = Cart::new();
        cart.add_item(&product("a", "19.99", None), 3).unwrap();

        let totals = cart.totals();
        assert_eq!(totals.items_price, "59.97".parse().unwrap());
        assert_eq!(totals.shipping_price, SHIPPING_FEE);
        // 15 % of 59.97 = 8.9955 -> 9.00
        assert_eq!(totals.tax_price, "9.00".parse().unwrap());
        assert_eq!(totals.total_price, "78.97".parse().unwrap());
    }

    #[test]
    fn test_totals_free_shipping_is_strictly_above_threshold() {
        let at_threshold = CartTotals::for_items_price(Money::from_units(100));
        assert_eq!(at_threshold.shipping_price, SHIPPING_FEE);

        let above = CartTotals::for_items_price("100.01".parse().unwrap());
        assert_eq!(above.shipping_price, Money::ZERO);
    }

    #[test]
    fn test_clear_keeps_checkout_details() {
        let mut cart = Cart::new();
        cart.add_item(&product("a", "10", None), 1).unwrap();
        cart.save_shipping_address(ShippingAddress {
            full_name: "Ana".into(),
            phone: "300".into(),
            address: "Calle 1".into(),
            city: "Medellín".into(),
            postal_code: "050001".into(),
            country: "Colombia".into(),
        });
        cart.save_payment_method(PaymentMethod::Pse);

        cart.clear_cart();
        assert!(cart.is_empty());
        assert!(cart.shipping_address().is_some());
        assert_eq!(cart.payment_method(), PaymentMethod::Pse);
    }

    #[test]
    fn test_shipping_address_validation() {
        let address = ShippingAddress {
            full_name: "  Ana ".into(),
            phone: " ".into(),
            address: "Calle 1".into(),
            city: String::new(),
            postal_code: "050001".into(),
            country: "Colombia".into(),
        };
        assert_eq!(address.validate(), Err(vec!["phone", "city"]));

        let ok = ShippingAddress {
            full_name: "  Ana ".into(),
            phone: "300".into(),
            address: "Calle 1".into(),
            city: "Medellín".into(),
            postal_code: "050001".into(),
            country: "Colombia".into(),
        }
        .validate()
        .unwrap();
        assert_eq!(ok.full_name, "Ana");
    }

    #[test]
    fn test_session_round_trip_tolerates_missing_fields() {
        let cart: Cart = serde_json::from_str("{}").unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.payment_method(), PaymentMethod::PayPal);

        let mut cart = Cart::new();
        cart.add_item(&product("a", "10", None), 2).unwrap();
        let json = serde_json::to_value(&cart).unwrap();
        let back: Cart = serde_json::from_value(json).unwrap();
        assert_eq!(back, cart);
    }
}
