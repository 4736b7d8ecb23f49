pub mod checkout;
pub mod lifecycle;
pub mod memory;
pub mod metrics;
pub mod models;
pub mod reconcile;
pub mod repository;
pub mod settlement;

pub use models::{
    Order, OrderItem, OrderPaymentStatus, OrderStatus, Payment, ShippingStatus, SupplierSettlement,
};
