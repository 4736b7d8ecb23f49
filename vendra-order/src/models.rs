use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vendra_shared::Address;

/// Order status in the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Refunded => "REFUNDED",
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(OrderStatus::Pending),
            "PROCESSING" => Ok(OrderStatus::Processing),
            "SHIPPED" => Ok(OrderStatus::Shipped),
            "DELIVERED" => Ok(OrderStatus::Delivered),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            "REFUNDED" => Ok(OrderStatus::Refunded),
            other => Err(format!("unknown order status: {}", other)),
        }
    }
}

/// Whether the order's money has arrived, independent of fulfillment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderPaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl OrderPaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderPaymentStatus::Pending => "PENDING",
            OrderPaymentStatus::Paid => "PAID",
            OrderPaymentStatus::Failed => "FAILED",
            OrderPaymentStatus::Refunded => "REFUNDED",
        }
    }
}

impl std::str::FromStr for OrderPaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(OrderPaymentStatus::Pending),
            "PAID" => Ok(OrderPaymentStatus::Paid),
            "FAILED" => Ok(OrderPaymentStatus::Failed),
            "REFUNDED" => Ok(OrderPaymentStatus::Refunded),
            other => Err(format!("unknown payment status: {}", other)),
        }
    }
}

/// Physical fulfillment progress. Evolves independently of `OrderStatus`
/// but constrains cancellation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShippingStatus {
    NotShipped,
    Shipped,
    Delivered,
}

impl ShippingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShippingStatus::NotShipped => "NOT_SHIPPED",
            ShippingStatus::Shipped => "SHIPPED",
            ShippingStatus::Delivered => "DELIVERED",
        }
    }
}

impl std::str::FromStr for ShippingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NOT_SHIPPED" => Ok(ShippingStatus::NotShipped),
            "SHIPPED" => Ok(ShippingStatus::Shipped),
            "DELIVERED" => Ok(ShippingStatus::Delivered),
            other => Err(format!("unknown shipping status: {}", other)),
        }
    }
}

/// Order item status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderItemStatus {
    Active,
    Cancelled,
}

impl OrderItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderItemStatus::Active => "ACTIVE",
            OrderItemStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::str::FromStr for OrderItemStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(OrderItemStatus::Active),
            "CANCELLED" => Ok(OrderItemStatus::Cancelled),
            other => Err(format!("unknown order item status: {}", other)),
        }
    }
}

/// The single source of truth for a customer's purchase.
///
/// Addresses and monetary totals are snapshots derived once at creation and
/// immutable afterwards; `grand_total_cents` always equals
/// `subtotal + tax + shipping - discount`. The transition timestamps are
/// each set at most once, on the first transition into that status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub customer_ref: String,
    pub user_id: Option<Uuid>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub customer_notes: Option<String>,
    pub shipping_method: String,
    pub tracking_number: Option<String>,
    pub admin_notes: Option<String>,
    pub billing_address: Address,
    pub shipping_address: Address,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub shipping_cents: i64,
    pub discount_cents: i64,
    pub grand_total_cents: i64,
    pub status: OrderStatus,
    pub payment_status: OrderPaymentStatus,
    pub shipping_status: ShippingStatus,
    pub order_date: DateTime<Utc>,
    pub processing_date: Option<DateTime<Utc>>,
    pub shipped_date: Option<DateTime<Utc>>,
    pub delivered_date: Option<DateTime<Utc>>,
    pub cancelled_date: Option<DateTime<Utc>>,
    pub cancel_reason: Option<String>,
    pub cancel_notes: Option<String>,
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Distinct supplier ids across the order's items, in first-seen order.
    pub fn distinct_supplier_ids(&self) -> Vec<Uuid> {
        let mut seen = Vec::new();
        for item in &self.items {
            if !seen.contains(&item.supplier_id) {
                seen.push(item.supplier_id);
            }
        }
        seen
    }

    pub fn has_item_from(&self, supplier_id: Uuid) -> bool {
        self.items.iter().any(|i| i.supplier_id == supplier_id)
    }

    pub fn items_total_cents(&self) -> i64 {
        self.items.iter().map(|i| i.total_price_cents).sum()
    }
}

/// An individual product within an order, snapshotted from the cart line.
/// Only `status` may change after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub supplier_id: Uuid,
    pub name: String,
    pub sku: String,
    pub brand: Option<String>,
    pub image_url: Option<String>,
    pub unit_price_cents: i64,
    pub quantity: i32,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub total_price_cents: i64,
    pub status: OrderItemStatus,
    pub created_at: DateTime<Utc>,
}

/// Payment record status, mapped from the gateway's own status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentRecordStatus {
    Succeeded,
    Failed,
}

impl PaymentRecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentRecordStatus::Succeeded => "SUCCEEDED",
            PaymentRecordStatus::Failed => "FAILED",
        }
    }
}

impl std::str::FromStr for PaymentRecordStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUCCEEDED" => Ok(PaymentRecordStatus::Succeeded),
            "FAILED" => Ok(PaymentRecordStatus::Failed),
            other => Err(format!("unknown payment record status: {}", other)),
        }
    }
}

/// One row per gateway charge attempt, failed attempts included.
/// `raw_response` keeps the provider payload verbatim for audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub order_id: Uuid,
    pub supplier_id: Uuid,
    pub transaction_id: Option<String>,
    pub amount_cents: i64,
    pub fee_cents: i64,
    pub net_cents: i64,
    pub currency: String,
    pub status: PaymentRecordStatus,
    pub failure_message: Option<String>,
    pub raw_response: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SettlementStatus {
    Pending,
    Paid,
}

impl SettlementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettlementStatus::Pending => "PENDING",
            SettlementStatus::Paid => "PAID",
        }
    }
}

impl std::str::FromStr for SettlementStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(SettlementStatus::Pending),
            "PAID" => Ok(SettlementStatus::Paid),
            other => Err(format!("unknown settlement status: {}", other)),
        }
    }
}

/// A supplier's ledger entry for its share of one paid order.
/// Unique per (supplier, order, payment); `gross = commission + net` always.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierSettlement {
    pub id: Uuid,
    pub supplier_id: Uuid,
    pub order_id: Uuid,
    pub payment_id: Uuid,
    pub transaction_ref: String,
    pub gross_cents: i64,
    pub commission_cents: i64,
    pub net_cents: i64,
    pub status: SettlementStatus,
    pub created_at: DateTime<Utc>,
}

/// Storefront profile created lazily on an authenticated caller's first order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}
