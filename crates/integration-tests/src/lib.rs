//! Test harness for the BestDeal storefront.
//!
//! [`TestApp::spawn`] starts an in-process fake of the BestDeal REST API and
//! a storefront wired to it (with an in-memory session store), both on
//! ephemeral ports. Tests drive the storefront over HTTP with a cookie-aware
//! client that does not follow redirects, so every hop can be asserted.
//!
//! # Fake accounts
//!
//! | Email                    | Password    | Role  | Notes                          |
//! |--------------------------|-------------|-------|--------------------------------|
//! | `ana@bestdeal.test`      | `secret123` | user  |                                |
//! | `admin@bestdeal.test`    | `admin123`  | admin |                                |
//! | `expired@bestdeal.test`  | `secret123` | user  | token rejected by every route  |

#![allow(clippy::unwrap_used, clippy::missing_panics_doc, clippy::expect_used)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bestdeal_storefront::config::StorefrontConfig;
use bestdeal_storefront::state::AppState;
use reqwest::redirect::Policy;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower_sessions::MemoryStore;

// =============================================================================
// Fake API
// =============================================================================

struct Account {
    id: &'static str,
    name: &'static str,
    email: &'static str,
    password: &'static str,
    role: &'static str,
    token: &'static str,
}

static ACCOUNTS: [Account; 3] = [
    Account {
        id: "u-ana",
        name: "Ana Gómez",
        email: "ana@bestdeal.test",
        password: "secret123",
        role: "user",
        token: "tok-ana",
    },
    Account {
        id: "u-admin",
        name: "Admin BestDeal",
        email: "admin@bestdeal.test",
        password: "admin123",
        role: "admin",
        token: "tok-admin",
    },
    Account {
        id: "u-expired",
        name: "Eva Expirada",
        email: "expired@bestdeal.test",
        password: "secret123",
        role: "user",
        token: "tok-expired",
    },
];

/// Everything the fake API has been asked to store.
#[derive(Default)]
pub struct Recorded {
    pub orders: Vec<Value>,
    /// Units ordered per product id.
    pub sold: HashMap<String, u64>,
}

#[derive(Clone, Default)]
struct FakeApi {
    recorded: Arc<Mutex<Recorded>>,
}

/// The catalog, with stock reduced by what has been ordered.
fn products(recorded: &Recorded) -> Vec<Value> {
    let mut catalog = vec![
        json!({
            "_id": "p-mouse",
            "name": "Mouse Logitech G305",
            "description": "Mouse inalámbrico para juegos.",
            "price": 49.99,
            "image": "https://img.bestdeal.test/mouse.png",
            "brand": "Logitech",
            "category": { "_id": "c-perifericos", "name": "Periféricos" },
            "stock": 5,
            "rating": 4.5,
            "numReviews": 2,
            "reviews": [],
        }),
        json!({
            "_id": "p-teclado",
            "name": "Teclado Redragon Kumara",
            "price": 129.9,
            "brand": "Redragon",
            "category": { "_id": "c-perifericos", "name": "Periféricos" },
            "stock": 0,
        }),
    ];
    for product in &mut catalog {
        let sold = product["_id"]
            .as_str()
            .and_then(|id| recorded.sold.get(id))
            .copied()
            .unwrap_or_default();
        let stock = product["stock"].as_u64().unwrap_or_default();
        product["stock"] = json!(stock.saturating_sub(sold));
    }
    catalog
}

fn message(status: StatusCode, text: &str) -> Response {
    (status, Json(json!({ "message": text }))).into_response()
}

/// The account behind the bearer token, if it is accepted.
fn bearer(headers: &HeaderMap) -> Option<&'static Account> {
    let token = headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")?;
    ACCOUNTS
        .iter()
        .find(|account| account.token == token && account.token != "tok-expired")
}

/// The admin behind the bearer token, or the error the real API sends.
fn admin(headers: &HeaderMap) -> Result<&'static Account, Response> {
    match bearer(headers) {
        Some(account) if account.role == "admin" => Ok(account),
        Some(_) => Err(message(
            StatusCode::FORBIDDEN,
            "No autorizado como administrador",
        )),
        None => Err(message(StatusCode::UNAUTHORIZED, "Token inválido")),
    }
}

async fn login(Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    match ACCOUNTS
        .iter()
        .find(|a| a.email == email && a.password == password)
    {
        Some(account) => Json(json!({
            "_id": account.id,
            "name": account.name,
            "email": account.email,
            "role": account.role,
            "token": account.token,
        }))
        .into_response(),
        None => message(StatusCode::UNAUTHORIZED, "Email o contraseña inválidos"),
    }
}

async fn list_products(State(api): State<FakeApi>) -> Json<Value> {
    let recorded = api.recorded.lock().unwrap();
    Json(json!({ "products": products(&recorded), "page": 1, "pages": 1 }))
}

async fn recent_products(State(api): State<FakeApi>) -> Json<Value> {
    Json(Value::Array(products(&api.recorded.lock().unwrap())))
}

async fn product(State(api): State<FakeApi>, Path(id): Path<String>) -> Response {
    products(&api.recorded.lock().unwrap())
        .into_iter()
        .find(|p| p["_id"] == id.as_str())
        .map_or_else(
            || message(StatusCode::NOT_FOUND, "Producto no encontrado"),
            |p| Json(p).into_response(),
        )
}

async fn categories() -> Json<Value> {
    Json(json!([{ "_id": "c-perifericos", "name": "Periféricos" }]))
}

async fn empty_list() -> Json<Value> {
    Json(json!([]))
}

async fn place_order(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let Some(account) = bearer(&headers) else {
        return message(StatusCode::UNAUTHORIZED, "Token inválido");
    };
    let mut recorded = api.recorded.lock().unwrap();
    let number = 1001 + recorded.orders.len();
    let mut order = body;
    order["_id"] = json!(format!("o-{number}"));
    order["orderNumber"] = json!(number);
    order["user"] = json!({ "_id": account.id, "name": account.name, "email": account.email });
    order["createdAt"] = json!("2026-10-18T15:30:00Z");
    for item in order["orderItems"].as_array().into_iter().flatten() {
        if let (Some(id), Some(quantity)) = (item["product"].as_str(), item["quantity"].as_u64()) {
            *recorded.sold.entry(id.to_string()).or_default() += quantity;
        }
    }
    recorded.orders.push(order.clone());
    (StatusCode::CREATED, Json(order)).into_response()
}

async fn my_orders(State(api): State<FakeApi>, headers: HeaderMap) -> Response {
    let Some(account) = bearer(&headers) else {
        return message(StatusCode::UNAUTHORIZED, "Token inválido");
    };
    let recorded = api.recorded.lock().unwrap();
    let mine: Vec<Value> = recorded
        .orders
        .iter()
        .filter(|order| order["user"]["_id"] == account.id)
        .cloned()
        .collect();
    Json(Value::Array(mine)).into_response()
}

async fn all_orders(State(api): State<FakeApi>, headers: HeaderMap) -> Response {
    if let Err(response) = admin(&headers) {
        return response;
    }
    Json(Value::Array(api.recorded.lock().unwrap().orders.clone())).into_response()
}

async fn order(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if bearer(&headers).is_none() {
        return message(StatusCode::UNAUTHORIZED, "Token inválido");
    }
    let recorded = api.recorded.lock().unwrap();
    recorded
        .orders
        .iter()
        .find(|order| order["_id"] == id.as_str())
        .map_or_else(
            || message(StatusCode::NOT_FOUND, "Pedido no encontrado"),
            |order| Json(order.clone()).into_response(),
        )
}

async fn my_tickets(headers: HeaderMap) -> Response {
    if bearer(&headers).is_none() {
        return message(StatusCode::UNAUTHORIZED, "Token inválido");
    }
    Json(json!([])).into_response()
}

async fn all_tickets(headers: HeaderMap) -> Response {
    if let Err(response) = admin(&headers) {
        return response;
    }
    Json(json!([{
        "_id": "t-1",
        "subject": "Mi pedido no ha llegado",
        "status": "Abierto",
        "user": { "_id": "u-ana", "name": "Ana Gómez", "email": "ana@bestdeal.test" },
        "messages": [],
        "createdAt": "2026-10-17T09:00:00Z",
    }]))
    .into_response()
}

async fn users(headers: HeaderMap) -> Response {
    if let Err(response) = admin(&headers) {
        return response;
    }
    let users: Vec<Value> = ACCOUNTS
        .iter()
        .map(|account| {
            json!({
                "_id": account.id,
                "name": account.name,
                "email": account.email,
                "role": account.role,
            })
        })
        .collect();
    Json(Value::Array(users)).into_response()
}

async fn summary(State(api): State<FakeApi>, headers: HeaderMap) -> Response {
    if let Err(response) = admin(&headers) {
        return response;
    }
    let recorded = api.recorded.lock().unwrap();
    let orders = recorded.orders.len();
    Json(json!({
        "totalRevenue": 1_234_567.5,
        "totalActiveOrders": orders,
        "totalUsers": ACCOUNTS.len(),
        "totalProducts": products(&recorded).len(),
        "totalTickets": 1,
        "orderStatusCounts": { "Pendiente": orders },
        "ticketStatusCounts": { "Abierto": 1 },
    }))
    .into_response()
}

fn fake_api_router(api: FakeApi) -> Router {
    let routes = Router::new()
        .route("/users", get(users))
        .route("/users/login", post(login))
        .route("/products", get(list_products))
        .route("/products/recent", get(recent_products))
        .route("/products/{id}", get(product))
        .route("/categories", get(categories))
        .route("/brands", get(empty_list))
        .route("/banners", get(empty_list))
        .route("/orders", post(place_order))
        .route("/orders/all", get(all_orders))
        .route("/orders/myorders", get(my_orders))
        .route("/orders/{id}", get(order))
        .route("/tickets", get(all_tickets))
        .route("/tickets/mytickets", get(my_tickets))
        .route("/summary", get(summary))
        .with_state(api);
    Router::new().nest("/api", routes)
}

async fn spawn_router(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

// =============================================================================
// Storefront under test
// =============================================================================

/// A running storefront plus the fake API behind it.
pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
    recorded: Arc<Mutex<Recorded>>,
}

impl TestApp {
    /// Start the fake API and a storefront pointed at it.
    pub async fn spawn() -> Self {
        let fake = FakeApi::default();
        let recorded = Arc::clone(&fake.recorded);
        let api_addr = spawn_router(fake_api_router(fake)).await;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let vars: HashMap<&str, String> = HashMap::from([
            ("STOREFRONT_DATABASE_URL", "postgres://unused".to_string()),
            ("STOREFRONT_BASE_URL", format!("http://{addr}")),
            ("BESTDEAL_API_URL", format!("http://{api_addr}/api")),
            (
                "STOREFRONT_STATIC_DIR",
                concat!(env!("CARGO_MANIFEST_DIR"), "/../storefront/static").to_string(),
            ),
        ]);
        let config = StorefrontConfig::from_lookup(|key| vars.get(key).cloned()).unwrap();
        let state = AppState::new(config).unwrap();
        let app = bestdeal_storefront::app(state, MemoryStore::default());

        tokio::spawn(async move {
            bestdeal_storefront::serve(listener, app, std::future::pending())
                .await
                .unwrap();
        });

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(Policy::none())
            .build()
            .unwrap();

        Self {
            base_url: format!("http://{addr}"),
            client,
            recorded,
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }

    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .unwrap()
    }

    /// Sign in through the login form. Counts against the auth rate limit.
    pub async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.post_form("/login", &[("email", email), ("password", password)])
            .await
    }

    /// Orders the fake API has accepted.
    #[must_use]
    pub fn placed_orders(&self) -> Vec<Value> {
        self.recorded.lock().unwrap().orders.clone()
    }
}

/// The `Location` header of a redirect response.
#[must_use]
pub fn location(response: &reqwest::Response) -> &str {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}
