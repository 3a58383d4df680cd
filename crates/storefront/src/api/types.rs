//! Typed request and response bodies for the BestDeal REST API.
//!
//! The backend returns documents with a `_id` key and camelCase fields.
//! References to other documents arrive either populated (a nested object)
//! or as a bare id depending on the endpoint, which [`Ref`] covers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bestdeal_core::{
    BannerId, BrandId, CartItem, CartProduct, CategoryId, Money, OrderId, OrderStatus,
    PaymentMethod, ProductId, ShippingAddress, TicketId, TicketStatus, UserId, UserRole,
};

/// A reference that may or may not have been populated by the backend.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Ref<T, I> {
    Populated(T),
    Id(I),
}

impl<T, I> Ref<T, I> {
    /// The populated document, if the backend sent one.
    #[must_use]
    pub const fn populated(&self) -> Option<&T> {
        match self {
            Self::Populated(value) => Some(value),
            Self::Id(_) => None,
        }
    }
}

/// Body of error responses and of endpoints that only acknowledge.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiMessage {
    pub message: String,
}

// =============================================================================
// Catalog
// =============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: CategoryId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Brand {
    #[serde(rename = "_id")]
    pub id: BrandId,
    pub name: String,
}

/// Body for creating a category or a brand.
#[derive(Debug, Clone, Serialize)]
pub struct NameInput<'a> {
    pub name: &'a str,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(default)]
    pub name: String,
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewInput<'a> {
    pub rating: u8,
    pub comment: &'a str,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Money,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub category: Option<Ref<Category, CategoryId>>,
    #[serde(default, alias = "countInStock")]
    pub stock: Option<u32>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub num_reviews: Option<u32>,
    #[serde(default)]
    pub reviews: Vec<Review>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    #[must_use]
    pub fn category_name(&self) -> Option<&str> {
        self.category
            .as_ref()
            .and_then(Ref::populated)
            .map(|category| category.name.as_str())
    }

    #[must_use]
    pub fn category_id(&self) -> Option<&CategoryId> {
        self.category.as_ref().map(|category| match category {
            Ref::Populated(category) => &category.id,
            Ref::Id(id) => id,
        })
    }

    /// Unknown stock counts as available.
    #[must_use]
    pub fn is_in_stock(&self) -> bool {
        self.stock != Some(0)
    }

    /// The fields the cart store needs.
    #[must_use]
    pub fn to_cart_product(&self) -> CartProduct {
        CartProduct {
            id: self.id.clone(),
            name: self.name.clone(),
            image: self.image.clone(),
            brand: self.brand.clone(),
            price: self.price,
            stock: self.stock,
        }
    }
}

/// `GET /products` returns a bare array or a paged envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ProductListResponse {
    Paged {
        products: Vec<Product>,
        #[serde(default = "first_page")]
        page: u32,
        #[serde(default = "first_page")]
        pages: u32,
    },
    Plain(Vec<Product>),
}

const fn first_page() -> u32 {
    1
}

/// A page of products.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub page: u32,
    pub pages: u32,
}

impl From<ProductListResponse> for ProductPage {
    fn from(response: ProductListResponse) -> Self {
        match response {
            ProductListResponse::Paged {
                products,
                page,
                pages,
            } => Self {
                products,
                page,
                pages,
            },
            ProductListResponse::Plain(products) => Self {
                products,
                page: 1,
                pages: 1,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductSort {
    #[serde(rename = "price-asc")]
    PriceAsc,
    #[serde(rename = "price-desc")]
    PriceDesc,
}

impl ProductSort {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PriceAsc => "price-asc",
            Self::PriceDesc => "price-desc",
        }
    }
}

/// Filters for `GET /products`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct ProductQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<CategoryId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<ProductSort>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

/// Body for creating or updating a product.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductInput {
    pub name: String,
    pub brand: String,
    pub description: String,
    pub price: Money,
    pub stock: u32,
    pub category: CategoryId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

// =============================================================================
// Users
// =============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: UserRole,
}

/// The `user` field of orders and tickets.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserSummary {
    #[serde(rename = "_id", default)]
    pub id: Option<UserId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginInput<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterInput<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

// =============================================================================
// Orders
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product: ProductId,
    pub name: String,
    pub quantity: u32,
    pub price: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl OrderItem {
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.price * self.quantity
    }
}

impl From<&CartItem> for OrderItem {
    fn from(item: &CartItem) -> Self {
        Self {
            product: item.product.clone(),
            name: item.name.clone(),
            quantity: item.quantity,
            price: item.price,
            image: item.image.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: OrderId,
    #[serde(default)]
    pub order_number: Option<u64>,
    #[serde(default)]
    pub user: Option<Ref<UserSummary, UserId>>,
    #[serde(default)]
    pub order_items: Vec<OrderItem>,
    #[serde(default)]
    pub shipping_address: Option<ShippingAddress>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub items_price: Option<Money>,
    #[serde(default)]
    pub shipping_price: Option<Money>,
    #[serde(default)]
    pub tax_price: Option<Money>,
    pub total_price: Money,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_delivered: bool,
    #[serde(default)]
    pub delivered_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Order {
    /// `#1042`, or the raw id for orders without a number.
    #[must_use]
    pub fn number_label(&self) -> String {
        self.order_number
            .map_or_else(|| format!("#{}", self.id), |number| format!("#{number}"))
    }

    #[must_use]
    pub fn customer(&self) -> Option<&UserSummary> {
        self.user.as_ref().and_then(Ref::populated)
    }

    /// Status shown to people: the explicit one, else derived from delivery.
    #[must_use]
    pub fn status(&self) -> OrderStatus {
        self.status.unwrap_or(if self.is_delivered {
            OrderStatus::Entregado
        } else {
            OrderStatus::Pendiente
        })
    }
}

/// Body for `POST /orders`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder<'a> {
    pub order_items: Vec<OrderItem>,
    pub shipping_address: &'a ShippingAddress,
    pub payment_method: PaymentMethod,
    pub total_price: Money,
}

// =============================================================================
// Support tickets
// =============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketMessage {
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub name: String,
    pub text: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl TicketMessage {
    #[must_use]
    pub fn is_from_staff(&self) -> bool {
        self.sender == "admin"
    }
}

/// The `order` field of a ticket.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketOrder {
    #[serde(rename = "_id")]
    pub id: OrderId,
    #[serde(default)]
    pub order_number: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    #[serde(rename = "_id")]
    pub id: TicketId,
    pub subject: String,
    #[serde(default)]
    pub status: TicketStatus,
    #[serde(default)]
    pub user: Option<Ref<UserSummary, UserId>>,
    #[serde(default)]
    pub order: Option<Ref<TicketOrder, OrderId>>,
    #[serde(default)]
    pub messages: Vec<TicketMessage>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Ticket {
    #[must_use]
    pub fn author(&self) -> Option<&UserSummary> {
        self.user.as_ref().and_then(Ref::populated)
    }

    #[must_use]
    pub fn order_id(&self) -> Option<&OrderId> {
        self.order.as_ref().map(|order| match order {
            Ref::Populated(order) => &order.id,
            Ref::Id(id) => id,
        })
    }

    #[must_use]
    pub fn order_label(&self) -> Option<String> {
        self.order.as_ref().map(|order| match order {
            Ref::Populated(TicketOrder {
                order_number: Some(number),
                ..
            }) => format!("#{number}"),
            Ref::Populated(TicketOrder { id, .. }) | Ref::Id(id) => format!("#{id}"),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewTicket<'a> {
    pub subject: &'a str,
    pub message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<&'a OrderId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TicketReply<'a> {
    pub message: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct TicketStatusInput {
    pub status: TicketStatus,
}

// =============================================================================
// Banners, dashboard, uploads
// =============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    #[serde(rename = "_id")]
    pub id: BannerId,
    pub image_url: String,
    #[serde(default)]
    pub order: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBanner<'a> {
    pub image_url: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerOrder<'a> {
    pub banner_ids: &'a [BannerId],
}

/// Counters for the admin dashboard (`GET /summary`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Summary {
    pub total_revenue: Money,
    pub total_active_orders: u64,
    pub total_users: u64,
    pub total_products: u64,
    pub total_tickets: u64,
    pub order_status_counts: StatusCounts,
    pub ticket_status_counts: StatusCounts,
}

/// Status label to count, in the order the backend sent them.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct StatusCounts(serde_json::Map<String, serde_json::Value>);

impl StatusCounts {
    #[must_use]
    pub fn get(&self, label: &str) -> u64 {
        self.0
            .get(label)
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(0)
    }
}

/// `GET /upload/signature`.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadSignature {
    pub timestamp: serde_json::Value,
    pub signature: String,
}

/// The part of the image host's upload response the storefront uses.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadedImage {
    pub secure_url: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_product_with_populated_category() {
        let product: Product = serde_json::from_value(json!({
            "_id": "p1",
            "name": "Mouse Logitech G305",
            "price": 49.99,
            "brand": "Logitech",
            "category": { "_id": "c1", "name": "Periféricos" },
            "stock": 3,
        }))
        .unwrap();
        assert_eq!(product.category_name(), Some("Periféricos"));
        assert_eq!(product.category_id().unwrap().as_str(), "c1");
        assert!(product.is_in_stock());
        assert!(product.reviews.is_empty());
    }

    #[test]
    fn test_product_with_bare_category_and_count_in_stock() {
        let product: Product = serde_json::from_value(json!({
            "_id": "p1",
            "name": "Teclado",
            "price": "20",
            "category": "c9",
            "countInStock": 0,
        }))
        .unwrap();
        assert_eq!(product.category_name(), None);
        assert_eq!(product.category_id().unwrap().as_str(), "c9");
        assert!(!product.is_in_stock());
    }

    #[test]
    fn test_product_list_shapes() {
        let plain: ProductListResponse =
            serde_json::from_value(json!([{ "_id": "a", "name": "A", "price": 1 }])).unwrap();
        let page = ProductPage::from(plain);
        assert_eq!((page.page, page.pages, page.products.len()), (1, 1, 1));

        let paged: ProductListResponse = serde_json::from_value(json!({
            "products": [{ "_id": "a", "name": "A", "price": 1 }],
            "page": 2,
            "pages": 4,
        }))
        .unwrap();
        let page = ProductPage::from(paged);
        assert_eq!((page.page, page.pages), (2, 4));
    }

    #[test]
    fn test_product_query_omits_unset_filters() {
        let query = ProductQuery {
            search: Some("mouse".to_string()),
            sort: Some(ProductSort::PriceDesc),
            ..ProductQuery::default()
        };
        assert_eq!(
            serde_json::to_value(&query).unwrap(),
            json!({ "search": "mouse", "sort": "price-desc" })
        );
    }

    #[test]
    fn test_order_status_fallback_and_label() {
        let order: Order = serde_json::from_value(json!({
            "_id": "o1",
            "orderNumber": 1042,
            "user": { "_id": "u1", "name": "Ana", "email": "ana@x.co" },
            "orderItems": [{ "product": "p1", "name": "Mouse", "quantity": 2, "price": 10.5 }],
            "totalPrice": 31.15,
            "isDelivered": true,
        }))
        .unwrap();
        assert_eq!(order.number_label(), "#1042");
        assert_eq!(order.status(), OrderStatus::Entregado);
        assert_eq!(order.customer().unwrap().name, "Ana");
        assert_eq!(order.order_items[0].line_total(), "21".parse().unwrap());
    }

    #[test]
    fn test_new_order_body() {
        let address = ShippingAddress {
            full_name: "Ana".into(),
            phone: "300".into(),
            address: "Calle 1".into(),
            city: "Cali".into(),
            postal_code: "760001".into(),
            country: "Colombia".into(),
        };
        let body = NewOrder {
            order_items: vec![OrderItem {
                product: ProductId::parse("p1").unwrap(),
                name: "Mouse".into(),
                quantity: 1,
                price: "10".parse().unwrap(),
                image: None,
            }],
            shipping_address: &address,
            payment_method: PaymentMethod::Pse,
            total_price: "21.5".parse().unwrap(),
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["paymentMethod"], "PSE");
        assert_eq!(value["shippingAddress"]["postalCode"], "760001");
        assert_eq!(value["orderItems"][0]["product"], "p1");
        assert_eq!(value["totalPrice"], 21.5);
    }

    #[test]
    fn test_ticket_with_order_reference() {
        let ticket: Ticket = serde_json::from_value(json!({
            "_id": "t1",
            "subject": "Pedido incompleto",
            "status": "En proceso",
            "user": "u1",
            "order": { "_id": "o1", "orderNumber": 7 },
            "messages": [{ "sender": "admin", "name": "Soporte", "text": "Hola" }],
        }))
        .unwrap();
        assert_eq!(ticket.status, TicketStatus::EnProceso);
        assert!(ticket.author().is_none());
        assert_eq!(ticket.order_label().as_deref(), Some("#7"));
        assert!(ticket.messages[0].is_from_staff());
    }

    #[test]
    fn test_summary_tolerates_missing_counters() {
        let summary: Summary = serde_json::from_value(json!({
            "totalRevenue": 1234567,
            "orderStatusCounts": { "Pendiente": 4 },
        }))
        .unwrap();
        assert_eq!(summary.total_revenue.display_cop(), "$ 1.234.567,00");
        assert_eq!(summary.order_status_counts.get("Pendiente"), 4);
        assert_eq!(summary.order_status_counts.get("Enviado"), 0);
        assert_eq!(summary.total_users, 0);
    }
}
