use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vendra_api::{app, metrics::ApiMetrics, state::AuthSettings, AppState};
use vendra_cart::CartService;
use vendra_catalog::supplier::{FallbackResolution, StrictResolution, SupplierResolution};
use vendra_core::payment::MockPaymentGateway;
use vendra_order::checkout::{CheckoutOrchestrator, CheckoutRules};
use vendra_order::lifecycle::OrderLifecycle;
use vendra_order::metrics::SupplierDashboard;
use vendra_order::reconcile::PaymentReconciliation;
use vendra_order::settlement::SettlementSplitter;
use vendra_store::app_config::Config;
use vendra_store::catalog_repo::{StoreProductRepository, StoreSupplierRepository};
use vendra_store::cart_repo::StoreCartRepository;
use vendra_store::finance_repo::{
    StoreCustomerRepository, StorePaymentRepository, StoreSettlementRepository,
};
use vendra_store::order_repo::StoreOrderRepository;
use vendra_store::{DbClient, RedisClient};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "vendra_api=debug,tower_http=debug,axum::rejection=trace".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().expect("Failed to load config");
    tracing::info!("Starting Vendra API on port {}", config.server.port);

    let db = DbClient::new(&config.database.url)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    let redis = RedisClient::new(&config.redis.url)
        .await
        .expect("Failed to connect to Redis");

    let products = Arc::new(StoreProductRepository::new(db.pool.clone()));
    let suppliers = Arc::new(StoreSupplierRepository::new(db.pool.clone()));
    let carts = Arc::new(StoreCartRepository::new(db.pool.clone()));
    let orders = Arc::new(StoreOrderRepository::new(db.pool.clone()));
    let payment_rows = Arc::new(StorePaymentRepository::new(db.pool.clone()));
    let settlements = Arc::new(StoreSettlementRepository::new(db.pool.clone()));
    let customers = Arc::new(StoreCustomerRepository::new(db.pool.clone()));

    let rules = &config.business_rules;
    let resolution: Arc<dyn SupplierResolution> = if rules.strict_supplier_resolution {
        Arc::new(StrictResolution::new(suppliers.clone()))
    } else {
        Arc::new(FallbackResolution::new(suppliers.clone()))
    };

    // The gateway itself is an external collaborator; the mock adapter stands
    // in until a provider integration is wired.
    let gateway = Arc::new(MockPaymentGateway);

    let state = AppState {
        cart: Arc::new(CartService::new(carts.clone(), products.clone())),
        checkout: Arc::new(CheckoutOrchestrator::new(
            carts,
            products.clone(),
            customers,
            orders.clone(),
            CheckoutRules {
                free_shipping_threshold_cents: rules.free_shipping_threshold_cents,
                shipping_fee_cents: rules.shipping_fee_cents,
            },
        )),
        lifecycle: Arc::new(OrderLifecycle::new(orders.clone())),
        payments: Arc::new(PaymentReconciliation::new(
            orders.clone(),
            payment_rows,
            gateway,
            resolution,
            SettlementSplitter::new(settlements, rules.platform_commission_percent),
        )),
        dashboard: Arc::new(SupplierDashboard::new(products, orders.clone())),
        orders,
        redis: Some(Arc::new(redis)),
        auth: AuthSettings {
            secret: config.auth.jwt_secret.clone(),
        },
        metrics: Arc::new(ApiMetrics::new()),
        rate_limit_per_minute: rules.rate_limit_per_minute,
    };

    let app = app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Server error");
}
