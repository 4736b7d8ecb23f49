use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use vendra_api::auth::{encode_token, Claims};
use vendra_api::metrics::ApiMetrics;
use vendra_api::state::AuthSettings;
use vendra_api::{app, AppState};
use vendra_cart::memory::InMemoryCartRepository;
use vendra_cart::CartService;
use vendra_catalog::memory::{InMemoryProductRepository, InMemorySupplierRepository};
use vendra_catalog::product::{Product, ProductRepository};
use vendra_catalog::supplier::{FallbackResolution, Supplier, SupplierRepository};
use vendra_core::payment::MockPaymentGateway;
use vendra_order::checkout::{CheckoutOrchestrator, CheckoutRules};
use vendra_order::lifecycle::OrderLifecycle;
use vendra_order::memory::{
    InMemoryCustomerRepository, InMemoryOrderRepository, InMemoryPaymentRepository,
    InMemorySettlementRepository,
};
use vendra_order::metrics::SupplierDashboard;
use vendra_order::reconcile::PaymentReconciliation;
use vendra_order::settlement::SettlementSplitter;

const SECRET: &str = "test-secret";

struct Harness {
    app: Router,
    products: Arc<InMemoryProductRepository>,
    suppliers: Arc<InMemorySupplierRepository>,
}

/// The full application wired over in-memory ports, mock gateway included.
fn harness() -> Harness {
    let products = Arc::new(InMemoryProductRepository::new());
    let suppliers = Arc::new(InMemorySupplierRepository::new());
    let carts = Arc::new(InMemoryCartRepository::new());
    let customers = Arc::new(InMemoryCustomerRepository::new());
    let orders = Arc::new(InMemoryOrderRepository::new(products.clone(), carts.clone()));
    let payments = Arc::new(InMemoryPaymentRepository::new());
    let settlements = Arc::new(InMemorySettlementRepository::new());

    let state = AppState {
        cart: Arc::new(CartService::new(carts.clone(), products.clone())),
        checkout: Arc::new(CheckoutOrchestrator::new(
            carts,
            products.clone(),
            customers,
            orders.clone(),
            CheckoutRules::default(),
        )),
        lifecycle: Arc::new(OrderLifecycle::new(orders.clone())),
        payments: Arc::new(PaymentReconciliation::new(
            orders.clone(),
            payments,
            Arc::new(MockPaymentGateway),
            Arc::new(FallbackResolution::new(suppliers.clone())),
            SettlementSplitter::new(settlements, 2.0),
        )),
        dashboard: Arc::new(SupplierDashboard::new(products.clone(), orders.clone())),
        orders,
        redis: None,
        auth: AuthSettings {
            secret: SECRET.to_string(),
        },
        metrics: Arc::new(ApiMetrics::new()),
        rate_limit_per_minute: 100,
    };

    Harness {
        app: app(state),
        products,
        suppliers,
    }
}

async fn seed_supplier(harness: &Harness, name: &str) -> Uuid {
    let supplier = Supplier {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: format!("ops@{}.example", name.to_lowercase().replace(' ', "-")),
        is_system: false,
        created_at: chrono::Utc::now(),
    };
    harness.suppliers.insert_supplier(&supplier).await.unwrap();
    supplier.id
}

fn seed_product(harness: &Harness, supplier_id: Uuid, price_cents: i64, stock: i32) -> Uuid {
    let product = Product {
        id: Uuid::new_v4(),
        supplier_id,
        name: "Ceramic Pour-Over".to_string(),
        sku: format!("CP-{}", price_cents),
        brand: None,
        image_url: None,
        price_cents,
        stock,
        min_stock_quantity: 1,
        sold_count: 0,
        rating: None,
        is_published: true,
        created_at: chrono::Utc::now(),
    };
    let id = product.id;
    harness.products.seed(product);
    id
}

fn request(method: &str, uri: &str, session: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(session) = session {
        builder = builder.header("X-Session-Id", session);
    }
    match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&value).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn authed_request(method: &str, uri: &str, token: &str, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", format!("Bearer {}", token));
    match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&value).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn address() -> Value {
    json!({
        "recipient": "Ada Lovelace",
        "phone": "+44 20 7946 0000",
        "line1": "12 Analytical Row",
        "line2": null,
        "city": "London",
        "region": "Greater London",
        "postal_code": "N1 9GU",
        "country": "GB",
    })
}

fn checkout_payload() -> Value {
    json!({
        "shipping_method": "standard",
        "customer_notes": null,
        "billing_address": address(),
        "shipping_address": address(),
        "contact": {
            "name": "Ada Lovelace",
            "email": "ada@example.com",
            "phone": null,
        },
    })
}

fn supplier_token(supplier_id: Uuid) -> String {
    encode_token(
        &Claims {
            sub: Uuid::new_v4().to_string(),
            email: None,
            role: "SUPPLIER".to_string(),
            supplier_id: Some(supplier_id),
            exp: 4_102_444_800,
        },
        SECRET,
    )
    .unwrap()
}

fn admin_token() -> String {
    encode_token(
        &Claims {
            sub: Uuid::new_v4().to_string(),
            email: None,
            role: "ADMIN".to_string(),
            supplier_id: None,
            exp: 4_102_444_800,
        },
        SECRET,
    )
    .unwrap()
}

#[tokio::test]
async fn test_cart_to_paid_settlement_flow() {
    let harness = harness();
    let supplier_id = seed_supplier(&harness, "Loom and Thread").await;
    // price 30.00, qty 2 => subtotal 60.00 => free shipping
    let product_id = seed_product(&harness, supplier_id, 3_000, 10);
    let session = Some("s-1");

    let (status, _) = send(
        &harness.app,
        request(
            "POST",
            "/v1/cart/items",
            session,
            Some(json!({ "product_id": product_id, "quantity": 2 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, cart) = send(&harness.app, request("GET", "/v1/cart", session, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["subtotal_cents"], 6_000);

    let (status, order) = send(
        &harness.app,
        request("POST", "/v1/checkout", session, Some(checkout_payload())),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["subtotal_cents"], 6_000);
    assert_eq!(order["shipping_cents"], 0);
    assert_eq!(order["grand_total_cents"], 6_000);
    assert_eq!(order["status"], "PENDING");

    // Stock decremented, cart empty.
    let product = harness
        .products
        .get_product(product_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(product.stock, 8);
    let (_, cart) = send(&harness.app, request("GET", "/v1/cart", session, None)).await;
    assert!(cart["items"].as_array().unwrap().is_empty());

    // Pay the order; settlement completes inline.
    let order_id = order["id"].as_str().unwrap();
    let (status, outcome) = send(
        &harness.app,
        request(
            "POST",
            &format!("/v1/orders/{}/payments", order_id),
            session,
            Some(json!({
                "token": "tok_visa",
                "amount_cents": 6_000,
                "currency": "USD",
                "email": "ada@example.com",
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["payment"]["status"], "SUCCEEDED");
    assert_eq!(outcome["settlement_status"], "COMPLETED");
    let settlements = outcome["settlements"].as_array().unwrap();
    assert_eq!(settlements.len(), 1);
    assert_eq!(settlements[0]["gross_cents"], 6_000);
    assert_eq!(settlements[0]["commission_cents"], 120);
    assert_eq!(settlements[0]["net_cents"], 5_880);

    // The order reflects payment, and the owner can read it back.
    let (status, fetched) = send(
        &harness.app,
        request("GET", &format!("/v1/orders/{}", order_id), session, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["payment_status"], "PAID");

    let (_, listed) = send(&harness.app, request("GET", "/v1/orders", session, None)).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_empty_cart_checkout_is_a_conflict() {
    let harness = harness();
    let (status, body) = send(
        &harness.app,
        request("POST", "/v1/checkout", Some("s-1"), Some(checkout_payload())),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("empty"));
}

#[tokio::test]
async fn test_insufficient_stock_conflict_leaves_state_untouched() {
    let harness = harness();
    let supplier_id = seed_supplier(&harness, "Loom and Thread").await;
    let product_id = seed_product(&harness, supplier_id, 3_000, 1);
    let session = Some("s-1");

    send(
        &harness.app,
        request(
            "POST",
            "/v1/cart/items",
            session,
            Some(json!({ "product_id": product_id, "quantity": 3 })),
        ),
    )
    .await;

    let (status, body) = send(
        &harness.app,
        request("POST", "/v1/checkout", session, Some(checkout_payload())),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("Ceramic Pour-Over"));
    assert!(message.contains("available 1"));

    // No partial mutation: stock and cart both intact.
    let product = harness
        .products
        .get_product(product_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(product.stock, 1);
    let (_, cart) = send(&harness.app, request("GET", "/v1/cart", session, None)).await;
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_cancel_restores_stock_and_rejects_a_second_attempt() {
    let harness = harness();
    let supplier_id = seed_supplier(&harness, "Loom and Thread").await;
    let product_id = seed_product(&harness, supplier_id, 3_000, 10);
    let session = Some("s-1");

    send(
        &harness.app,
        request(
            "POST",
            "/v1/cart/items",
            session,
            Some(json!({ "product_id": product_id, "quantity": 2 })),
        ),
    )
    .await;
    let (_, order) = send(
        &harness.app,
        request("POST", "/v1/checkout", session, Some(checkout_payload())),
    )
    .await;
    let order_id = order["id"].as_str().unwrap().to_string();

    let (status, cancelled) = send(
        &harness.app,
        request(
            "POST",
            &format!("/v1/orders/{}/cancel", order_id),
            session,
            Some(json!({ "reason": "changed my mind", "notes": null })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "CANCELLED");
    assert!(cancelled["cancelled_date"].is_string());

    let product = harness
        .products
        .get_product(product_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(product.stock, 10);

    // Re-cancel is refused and must not restock again.
    let (status, _) = send(
        &harness.app,
        request(
            "POST",
            &format!("/v1/orders/{}/cancel", order_id),
            session,
            Some(json!({ "reason": "again", "notes": null })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    let product = harness
        .products
        .get_product(product_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(product.stock, 10);
}

#[tokio::test]
async fn test_strangers_cannot_read_or_cancel_an_order() {
    let harness = harness();
    let supplier_id = seed_supplier(&harness, "Loom and Thread").await;
    let product_id = seed_product(&harness, supplier_id, 3_000, 10);

    send(
        &harness.app,
        request(
            "POST",
            "/v1/cart/items",
            Some("s-1"),
            Some(json!({ "product_id": product_id, "quantity": 1 })),
        ),
    )
    .await;
    let (_, order) = send(
        &harness.app,
        request("POST", "/v1/checkout", Some("s-1"), Some(checkout_payload())),
    )
    .await;
    let order_id = order["id"].as_str().unwrap();

    let (status, _) = send(
        &harness.app,
        request("GET", &format!("/v1/orders/{}", order_id), Some("s-2"), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &harness.app,
        request(
            "POST",
            &format!("/v1/orders/{}/cancel", order_id),
            Some("s-2"),
            Some(json!({ "reason": "not mine", "notes": null })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_requests_without_identity_are_unauthorized() {
    let harness = harness();

    let (status, _) = send(&harness.app, request("GET", "/v1/cart", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &harness.app,
        authed_request("GET", "/v1/cart", "not-a-jwt", None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Health stays open.
    let (status, _) = send(&harness.app, request("GET", "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_admin_update_stamps_dates_and_rejects_unknown_status() {
    let harness = harness();
    let supplier_id = seed_supplier(&harness, "Loom and Thread").await;
    let product_id = seed_product(&harness, supplier_id, 3_000, 10);
    let session = Some("s-1");

    send(
        &harness.app,
        request(
            "POST",
            "/v1/cart/items",
            session,
            Some(json!({ "product_id": product_id, "quantity": 1 })),
        ),
    )
    .await;
    let (_, order) = send(
        &harness.app,
        request("POST", "/v1/checkout", session, Some(checkout_payload())),
    )
    .await;
    let order_id = order["id"].as_str().unwrap().to_string();
    let token = admin_token();

    // The customer may not drive the admin path.
    let (status, _) = send(
        &harness.app,
        request(
            "PATCH",
            &format!("/v1/orders/{}", order_id),
            session,
            Some(json!({ "status": "PROCESSING" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, updated) = send(
        &harness.app,
        authed_request(
            "PATCH",
            &format!("/v1/orders/{}", order_id),
            &token,
            Some(json!({ "status": "PROCESSING" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "PROCESSING");
    let stamped = updated["processing_date"].as_str().unwrap().to_string();

    // Idempotent re-application keeps the original stamp.
    let (_, again) = send(
        &harness.app,
        authed_request(
            "PATCH",
            &format!("/v1/orders/{}", order_id),
            &token,
            Some(json!({ "status": "PROCESSING" })),
        ),
    )
    .await;
    assert_eq!(again["processing_date"].as_str().unwrap(), stamped);

    let (status, body) = send(
        &harness.app,
        authed_request(
            "PATCH",
            &format!("/v1/orders/{}", order_id),
            &token,
            Some(json!({ "status": "SIDEWAYS" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("SIDEWAYS"));
}

#[tokio::test]
async fn test_multi_supplier_order_payment_must_be_split() {
    let harness = harness();
    let supplier_a = seed_supplier(&harness, "Loom and Thread").await;
    let supplier_b = seed_supplier(&harness, "Copper Kettle Co").await;
    // 100.00 from supplier A, 50.00 from supplier B.
    let product_a = seed_product(&harness, supplier_a, 10_000, 5);
    let product_b = seed_product(&harness, supplier_b, 5_000, 5);
    let session = Some("s-1");

    for product_id in [product_a, product_b] {
        send(
            &harness.app,
            request(
                "POST",
                "/v1/cart/items",
                session,
                Some(json!({ "product_id": product_id, "quantity": 1 })),
            ),
        )
        .await;
    }
    let (_, order) = send(
        &harness.app,
        request("POST", "/v1/checkout", session, Some(checkout_payload())),
    )
    .await;
    let order_id = order["id"].as_str().unwrap().to_string();

    // Without an explicit supplier the payment is refused.
    let (status, body) = send(
        &harness.app,
        request(
            "POST",
            &format!("/v1/orders/{}/payments", order_id),
            session,
            Some(json!({
                "token": "tok_visa",
                "amount_cents": 15_000,
                "currency": "USD",
                "email": "ada@example.com",
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("2 suppliers"));

    // An explicit supplier unblocks it; the split still covers the whole
    // order, one pending row per supplier, money conserved at 2% commission.
    let (status, outcome) = send(
        &harness.app,
        request(
            "POST",
            &format!("/v1/orders/{}/payments", order_id),
            session,
            Some(json!({
                "supplier_id": supplier_a,
                "token": "tok_visa",
                "amount_cents": 10_000,
                "currency": "USD",
                "email": "ada@example.com",
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let settlements = outcome["settlements"].as_array().unwrap();
    assert_eq!(settlements.len(), 2);
    let mut gross_total = 0;
    for row in settlements {
        let gross = row["gross_cents"].as_i64().unwrap();
        let commission = row["commission_cents"].as_i64().unwrap();
        let net = row["net_cents"].as_i64().unwrap();
        assert_eq!(gross, commission + net);
        gross_total += gross;
    }
    assert_eq!(gross_total, 15_000);
    let by_supplier: Vec<i64> = settlements
        .iter()
        .map(|r| r["commission_cents"].as_i64().unwrap())
        .collect();
    assert!(by_supplier.contains(&200));
    assert!(by_supplier.contains(&100));
}

#[tokio::test]
async fn test_declined_payment_surfaces_payment_required() {
    let harness = harness();
    let supplier_id = seed_supplier(&harness, "Loom and Thread").await;
    let product_id = seed_product(&harness, supplier_id, 6_000, 5);
    let session = Some("s-1");

    send(
        &harness.app,
        request(
            "POST",
            "/v1/cart/items",
            session,
            Some(json!({ "product_id": product_id, "quantity": 1 })),
        ),
    )
    .await;
    let (_, order) = send(
        &harness.app,
        request("POST", "/v1/checkout", session, Some(checkout_payload())),
    )
    .await;
    let order_id = order["id"].as_str().unwrap();

    let (status, _) = send(
        &harness.app,
        request(
            "POST",
            &format!("/v1/orders/{}/payments", order_id),
            session,
            Some(json!({
                "token": "tok_declined",
                "amount_cents": 6_000,
                "currency": "USD",
                "email": "ada@example.com",
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
}

#[tokio::test]
async fn test_supplier_dashboard_requires_the_right_supplier() {
    let harness = harness();
    let supplier_id = seed_supplier(&harness, "Loom and Thread").await;
    seed_product(&harness, supplier_id, 3_000, 10);

    let (status, snapshot) = send(
        &harness.app,
        authed_request(
            "GET",
            &format!("/v1/suppliers/{}/dashboard", supplier_id),
            &supplier_token(supplier_id),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snapshot["published_products"], 1);
    assert_eq!(snapshot["total_stock"], 10);

    // Another supplier's token is refused; an admin's is not.
    let (status, _) = send(
        &harness.app,
        authed_request(
            "GET",
            &format!("/v1/suppliers/{}/dashboard", supplier_id),
            &supplier_token(Uuid::new_v4()),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &harness.app,
        authed_request(
            "GET",
            &format!("/v1/suppliers/{}/dashboard", supplier_id),
            &admin_token(),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_metrics_endpoint_counts_checkouts() {
    let harness = harness();
    let supplier_id = seed_supplier(&harness, "Loom and Thread").await;
    let product_id = seed_product(&harness, supplier_id, 3_000, 10);
    let session = Some("s-1");

    send(
        &harness.app,
        request(
            "POST",
            "/v1/cart/items",
            session,
            Some(json!({ "product_id": product_id, "quantity": 1 })),
        ),
    )
    .await;
    send(
        &harness.app,
        request("POST", "/v1/checkout", session, Some(checkout_payload())),
    )
    .await;

    let response = harness
        .app
        .clone()
        .oneshot(request("GET", "/metrics", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("vendra_checkouts_total 1"));
}
