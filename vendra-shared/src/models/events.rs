use crate::pii::Masked;
use uuid::Uuid;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct OrderPlacedEvent {
    pub order_id: Uuid,
    pub order_number: String,
    pub customer_ref: String,
    pub grand_total_cents: i64,
    pub item_count: usize,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct OrderCancelledEvent {
    pub order_id: Uuid,
    pub customer_ref: String,
    pub reason: String,
    pub restocked_units: i32,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, Clone)]
pub struct PaymentRecordedEvent {
    pub payment_id: Uuid,
    pub order_id: Uuid,
    pub supplier_id: Uuid,
    pub amount_cents: i64,
    pub succeeded: bool,
    pub customer_email: Masked<String>,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct SettlementDeferredEvent {
    pub order_id: Uuid,
    pub payment_id: Uuid,
    pub reason: String,
    pub timestamp: i64,
}
