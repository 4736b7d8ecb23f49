use std::sync::Arc;

use vendra_cart::CartService;
use vendra_order::checkout::CheckoutOrchestrator;
use vendra_order::lifecycle::OrderLifecycle;
use vendra_order::metrics::SupplierDashboard;
use vendra_order::reconcile::PaymentReconciliation;
use vendra_order::repository::OrderRepository;
use vendra_store::RedisClient;

use crate::metrics::ApiMetrics;

#[derive(Clone)]
pub struct AuthSettings {
    pub secret: String,
}

/// Handles shared by every request handler. Services are constructed once at
/// startup over injected ports, so tests can assemble the same state from the
/// in-memory implementations.
#[derive(Clone)]
pub struct AppState {
    pub cart: Arc<CartService>,
    pub checkout: Arc<CheckoutOrchestrator>,
    pub lifecycle: Arc<OrderLifecycle>,
    pub payments: Arc<PaymentReconciliation>,
    pub dashboard: Arc<SupplierDashboard>,
    pub orders: Arc<dyn OrderRepository>,
    /// Absent in tests; the rate-limit middleware then lets everything pass.
    pub redis: Option<Arc<RedisClient>>,
    pub auth: AuthSettings,
    pub metrics: Arc<ApiMetrics>,
    pub rate_limit_per_minute: i64,
}
