//! End-to-end flows through the storefront against the fake API.
//!
//! Each test spawns its own storefront, so rate limit buckets and sessions
//! are not shared between tests. Keep auth POSTs per test under the login
//! burst (5).

#![allow(clippy::unwrap_used)]

use bestdeal_integration_tests::{TestApp, location};
use reqwest::StatusCode;

#[tokio::test]
async fn test_health_and_ambient_headers() {
    let app = TestApp::spawn().await;

    let response = app.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert!(response.headers().contains_key("content-security-policy"));
    assert_eq!(response.text().await.unwrap(), "ok");

    assert_eq!(app.get("/health/ready").await.status(), StatusCode::OK);
    assert_eq!(
        app.get("/static/css/main.css").await.status(),
        StatusCode::OK
    );
    assert_eq!(app.get("/no-existe").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_catalog_pages_render() {
    let app = TestApp::spawn().await;

    let home = app.get("/").await;
    assert_eq!(home.status(), StatusCode::OK);
    assert!(home.text().await.unwrap().contains("Mouse Logitech G305"));

    // Trailing slashes are trimmed before routing.
    let shop = app.get("/tienda/").await;
    assert_eq!(shop.status(), StatusCode::OK);
    let body = shop.text().await.unwrap();
    assert!(body.contains("Teclado Redragon Kumara"));
    assert!(body.contains("Periféricos"));

    let product = app.get("/producto/p-mouse").await;
    assert_eq!(product.status(), StatusCode::OK);
    assert!(product.text().await.unwrap().contains("$49.99"));

    assert_eq!(
        app.get("/producto/p-desconocido").await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_cart_merges_lines_and_refuses_out_of_stock() {
    let app = TestApp::spawn().await;

    for _ in 0..2 {
        let response = app
            .post_form("/carrito/agregar", &[("product_id", "p-mouse")])
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/carrito");
    }
    let response = app
        .post_form("/carrito/agregar", &[("product_id", "p-teclado")])
        .await;
    assert_eq!(location(&response), "/carrito");

    let cart = app.get("/carrito").await.text().await.unwrap();
    assert!(cart.contains("$99.98"), "two units merged into one line");
    assert!(!cart.contains("/carrito/p-teclado/eliminar"));

    app.post_form("/carrito/p-mouse/eliminar", &[]).await;
    let cart = app.get("/carrito").await.text().await.unwrap();
    assert!(cart.contains("Tu carrito está vacío"));
}

#[tokio::test]
async fn test_login_failure_and_success() {
    let app = TestApp::spawn().await;

    let refused = app.login("ana@bestdeal.test", "incorrecta").await;
    assert_eq!(refused.status(), StatusCode::UNAUTHORIZED);
    assert!(
        refused
            .text()
            .await
            .unwrap()
            .contains("Email o contraseña inválidos")
    );

    let response = app.login("ana@bestdeal.test", "secret123").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let home = app.get("/").await.text().await.unwrap();
    assert!(home.contains("Hola, Ana"));

    let response = app.post_form("/logout", &[]).await;
    assert_eq!(location(&response), "/");
    let home = app.get("/").await.text().await.unwrap();
    assert!(home.contains("Ingresar"));
    assert!(!home.contains("Hola, Ana"));
}

#[tokio::test]
async fn test_protected_pages_redirect_to_login() {
    let app = TestApp::spawn().await;

    let response = app.get("/perfil").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?redirect=%2Fperfil");

    let response = app.get("/admin").await;
    assert_eq!(location(&response), "/login?redirect=%2Fadmin");

    let response = app.get("/admin/pedidos").await;
    assert_eq!(location(&response), "/login?redirect=%2Fadmin%2Fpedidos");

    let response = app.get("/admin/productos?buscar=mouse").await;
    assert_eq!(
        location(&response),
        "/login?redirect=%2Fadmin%2Fproductos%3Fbuscar%3Dmouse"
    );
}

#[tokio::test]
async fn test_login_returns_to_admin_page() {
    let app = TestApp::spawn().await;

    let response = app
        .post_form(
            "/login",
            &[
                ("email", "admin@bestdeal.test"),
                ("password", "admin123"),
                ("redirect", "/admin/pedidos"),
            ],
        )
        .await;
    assert_eq!(location(&response), "/admin/pedidos");

    let response = app
        .post_form(
            "/login",
            &[
                ("email", "admin@bestdeal.test"),
                ("password", "admin123"),
                ("redirect", "/\t/evil.example"),
            ],
        )
        .await;
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_full_checkout_places_order_and_clears_cart() {
    let app = TestApp::spawn().await;

    app.post_form(
        "/carrito/agregar",
        &[("product_id", "p-mouse"), ("quantity", "3")],
    )
    .await;

    let response = app.get("/carrito/pagar").await;
    assert_eq!(location(&response), "/login?redirect=%2Fenvio");

    let response = app
        .post_form(
            "/login",
            &[
                ("email", "ana@bestdeal.test"),
                ("password", "secret123"),
                ("redirect", "/envio"),
            ],
        )
        .await;
    assert_eq!(location(&response), "/envio");

    // Review is not reachable before an address is saved.
    let response = app.get("/realizar-pedido").await;
    assert_eq!(location(&response), "/envio");

    let response = app
        .post_form(
            "/envio",
            &[
                ("fullName", "Ana Gómez"),
                ("phone", "3001234567"),
                ("address", "Calle 10 # 5-20"),
                ("city", "Medellín"),
                ("postalCode", "050001"),
                ("country", "Colombia"),
            ],
        )
        .await;
    assert_eq!(location(&response), "/pago");

    let response = app.post_form("/pago", &[("payment_method", "PSE")]).await;
    assert_eq!(location(&response), "/realizar-pedido");

    let review = app.get("/realizar-pedido").await;
    assert_eq!(review.status(), StatusCode::OK);
    let body = review.text().await.unwrap();
    assert!(body.contains("PSE"));
    assert!(body.contains("Medellín"));

    let response = app.post_form("/realizar-pedido", &[]).await;
    assert_eq!(location(&response), "/pedido/o-1001");

    let orders = app.placed_orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["orderItems"][0]["quantity"], 3);
    assert_eq!(orders[0]["paymentMethod"], "PSE");
    assert_eq!(orders[0]["shippingAddress"]["city"], "Medellín");

    let order = app.get("/pedido/o-1001").await;
    assert_eq!(order.status(), StatusCode::OK);
    assert!(order.text().await.unwrap().contains("#1001"));

    let cart = app.get("/carrito").await.text().await.unwrap();
    assert!(cart.contains("Tu carrito está vacío"));
}

#[tokio::test]
async fn test_admin_area_requires_admin_role() {
    let app = TestApp::spawn().await;

    app.login("ana@bestdeal.test", "secret123").await;
    let response = app.get("/admin").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    let home = app.get("/").await.text().await.unwrap();
    assert!(home.contains("No tienes permisos"));

    app.post_form("/logout", &[]).await;
    app.login("admin@bestdeal.test", "admin123").await;
    let dashboard = app.get("/admin").await;
    assert_eq!(dashboard.status(), StatusCode::OK);
    let body = dashboard.text().await.unwrap();
    assert!(body.contains("$ 1.234.567,50"));
    assert!(body.contains("Pendiente"));
}

#[tokio::test]
async fn test_admin_pages_render() {
    let app = TestApp::spawn().await;
    app.login("admin@bestdeal.test", "admin123").await;

    let pages = [
        ("/admin", "Resumen"),
        ("/admin/productos", "Mouse Logitech G305"),
        ("/admin/productos?buscar=mouse", "Mouse Logitech G305"),
        ("/admin/productos/nuevo", "Nuevo producto"),
        ("/admin/productos/editar/p-mouse", "Editar producto"),
        ("/admin/pedidos", "Pedidos"),
        ("/admin/usuarios", "ana@bestdeal.test"),
        ("/admin/tickets", "Mi pedido no ha llegado"),
        ("/admin/tickets?estado=Abierto", "Mi pedido no ha llegado"),
        ("/admin/banners", "Banners de inicio"),
    ];
    for (path, expected) in pages {
        let response = app.get(path).await;
        assert_eq!(response.status(), StatusCode::OK, "{path}");
        let body = response.text().await.unwrap();
        assert!(body.contains(expected), "{path} should show {expected}");
    }

    let edit = app.get("/admin/productos/editar/p-mouse").await;
    assert!(edit.text().await.unwrap().contains("Periféricos"));
}

#[tokio::test]
async fn test_stock_is_refreshed_after_an_order() {
    let app = TestApp::spawn().await;
    app.login("ana@bestdeal.test", "secret123").await;

    let product = app.get("/producto/p-mouse").await.text().await.unwrap();
    assert!(product.contains("Solo quedan 5 unidades"));

    app.post_form(
        "/carrito/agregar",
        &[("product_id", "p-mouse"), ("quantity", "3")],
    )
    .await;
    app.post_form(
        "/envio",
        &[
            ("fullName", "Ana Gómez"),
            ("phone", "3001234567"),
            ("address", "Calle 10 # 5-20"),
            ("city", "Medellín"),
            ("postalCode", "050001"),
            ("country", "Colombia"),
        ],
    )
    .await;
    app.post_form("/pago", &[("payment_method", "PayPal")]).await;
    let response = app.post_form("/realizar-pedido", &[]).await;
    assert_eq!(location(&response), "/pedido/o-1001");

    let product = app.get("/producto/p-mouse").await.text().await.unwrap();
    assert!(product.contains("Solo quedan 2 unidades"));

    app.post_form(
        "/carrito/agregar",
        &[("product_id", "p-mouse"), ("quantity", "3")],
    )
    .await;
    let cart = app.get("/carrito").await.text().await.unwrap();
    assert!(cart.contains("Solo hay 2 unidades disponibles"));
}

#[tokio::test]
async fn test_rejected_token_signs_the_visitor_out() {
    let app = TestApp::spawn().await;

    app.login("expired@bestdeal.test", "secret123").await;
    let response = app.get("/perfil").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    let login_page = app.get("/login").await.text().await.unwrap();
    assert!(login_page.contains("Tu sesión expiró"));

    let response = app.get("/perfil").await;
    assert_eq!(location(&response), "/login?redirect=%2Fperfil");
}
