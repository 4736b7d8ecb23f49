use crate::models::{Customer, Order, OrderPaymentStatus, Payment, SupplierSettlement};
use async_trait::async_trait;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum CheckoutCommitError {
    #[error("Insufficient stock for product {product_id}")]
    OutOfStock { product_id: Uuid },

    #[error("Checkout commit failed: {0}")]
    Storage(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Repository trait for order data access.
///
/// `commit_checkout` and `commit_cancellation` are the two multi-row
/// mutations of the system; implementations must apply each one atomically
/// (every write visible together or not at all).
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persist the order with its items, decrement stock for every line and
    /// delete the session's cart lines, all in one unit of work. The stock
    /// decrement is conditional on sufficient stock; a short line aborts and
    /// rolls back the entire commit.
    async fn commit_checkout(
        &self,
        order: &Order,
        session_key: &str,
    ) -> Result<(), CheckoutCommitError>;

    async fn get_order(
        &self,
        id: Uuid,
    ) -> Result<Option<Order>, Box<dyn std::error::Error + Send + Sync>>;

    async fn list_orders(
        &self,
        customer_ref: &str,
    ) -> Result<Vec<Order>, Box<dyn std::error::Error + Send + Sync>>;

    /// Orders containing at least one item sold by the given supplier.
    async fn list_orders_with_supplier_items(
        &self,
        supplier_id: Uuid,
    ) -> Result<Vec<Order>, Box<dyn std::error::Error + Send + Sync>>;

    /// Persist the cancelled order and restore stock for every line, in one
    /// unit of work. Lines whose product no longer exists are skipped.
    async fn commit_cancellation(
        &self,
        order: &Order,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Persist status, shipping status, tracking and transition timestamps.
    async fn update_order(
        &self,
        order: &Order,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    async fn set_payment_status(
        &self,
        id: Uuid,
        status: OrderPaymentStatus,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Repository trait for gateway charge attempts.
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn insert_payment(
        &self,
        payment: &Payment,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    async fn list_by_order(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<Payment>, Box<dyn std::error::Error + Send + Sync>>;
}

/// Repository trait for per-supplier settlement rows.
#[async_trait]
pub trait SettlementRepository: Send + Sync {
    /// Insert unless a row for (order, payment, supplier) already exists.
    /// Returns false when the insert was skipped.
    async fn insert_if_absent(
        &self,
        settlement: &SupplierSettlement,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>>;

    async fn list_by_payment(
        &self,
        payment_id: Uuid,
    ) -> Result<Vec<SupplierSettlement>, Box<dyn std::error::Error + Send + Sync>>;
}

/// Repository trait for lazily-created customer profiles.
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn find_by_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<Customer>, Box<dyn std::error::Error + Send + Sync>>;

    async fn insert_customer(
        &self,
        customer: &Customer,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}
