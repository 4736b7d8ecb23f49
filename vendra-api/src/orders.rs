use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vendra_core::identity::CallerIdentity;
use vendra_order::checkout::{CheckoutRequest, CustomerContact};
use vendra_order::lifecycle::UpdateOrderRequest;
use vendra_order::models::{Order, OrderItem, OrderStatus, ShippingStatus};
use vendra_shared::pii::Masked;
use vendra_shared::Address;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ContactPayload {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutPayload {
    pub shipping_method: String,
    pub customer_notes: Option<String>,
    pub billing_address: Address,
    pub shipping_address: Address,
    pub contact: ContactPayload,
}

#[derive(Debug, Deserialize)]
pub struct CancelOrderPayload {
    pub reason: String,
    pub notes: Option<String>,
}

/// Status fields arrive as strings on the wire; anything outside the closed
/// enumerations is rejected as a validation error before the domain is
/// touched.
#[derive(Debug, Deserialize)]
pub struct UpdateOrderPayload {
    pub status: Option<String>,
    pub shipping_status: Option<String>,
    pub tracking_number: Option<String>,
    pub admin_notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub supplier_id: Uuid,
    pub name: String,
    pub sku: String,
    pub brand: Option<String>,
    pub image_url: Option<String>,
    pub unit_price_cents: i64,
    pub quantity: i32,
    pub total_price_cents: i64,
    pub status: String,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(item: OrderItem) -> Self {
        Self {
            id: item.id,
            product_id: item.product_id,
            supplier_id: item.supplier_id,
            name: item.name,
            sku: item.sku,
            brand: item.brand,
            image_url: item.image_url,
            unit_price_cents: item.unit_price_cents,
            quantity: item.quantity,
            total_price_cents: item.total_price_cents,
            status: item.status.as_str().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: Uuid,
    pub order_number: String,
    pub customer_name: String,
    pub customer_email: Masked<String>,
    pub customer_phone: Option<String>,
    pub customer_notes: Option<String>,
    pub shipping_method: String,
    pub tracking_number: Option<String>,
    pub billing_address: Address,
    pub shipping_address: Address,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub shipping_cents: i64,
    pub discount_cents: i64,
    pub grand_total_cents: i64,
    pub status: String,
    pub payment_status: String,
    pub shipping_status: String,
    pub order_date: DateTime<Utc>,
    pub processing_date: Option<DateTime<Utc>>,
    pub shipped_date: Option<DateTime<Utc>>,
    pub delivered_date: Option<DateTime<Utc>>,
    pub cancelled_date: Option<DateTime<Utc>>,
    pub cancel_reason: Option<String>,
    pub items: Vec<OrderItemResponse>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            order_number: order.order_number,
            customer_name: order.customer_name,
            customer_email: Masked(order.customer_email),
            customer_phone: order.customer_phone,
            customer_notes: order.customer_notes,
            shipping_method: order.shipping_method,
            tracking_number: order.tracking_number,
            billing_address: order.billing_address,
            shipping_address: order.shipping_address,
            subtotal_cents: order.subtotal_cents,
            tax_cents: order.tax_cents,
            shipping_cents: order.shipping_cents,
            discount_cents: order.discount_cents,
            grand_total_cents: order.grand_total_cents,
            status: order.status.as_str().to_string(),
            payment_status: order.payment_status.as_str().to_string(),
            shipping_status: order.shipping_status.as_str().to_string(),
            order_date: order.order_date,
            processing_date: order.processing_date,
            shipped_date: order.shipped_date,
            delivered_date: order.delivered_date,
            cancelled_date: order.cancelled_date,
            cancel_reason: order.cancel_reason,
            items: order.items.into_iter().map(OrderItemResponse::from).collect(),
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/checkout
/// Convert the caller's cart into an order.
pub async fn checkout(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Json(payload): Json<CheckoutPayload>,
) -> Result<Json<OrderResponse>, AppError> {
    let request = CheckoutRequest {
        shipping_method: payload.shipping_method,
        customer_notes: payload.customer_notes,
        billing_address: payload.billing_address,
        shipping_address: payload.shipping_address,
        contact: CustomerContact {
            name: payload.contact.name,
            email: payload.contact.email,
            phone: payload.contact.phone,
        },
    };

    let order = state.checkout.checkout(&caller, request).await?;
    state.metrics.checkouts_total.inc();
    Ok(Json(order.into()))
}

/// GET /v1/orders
/// The caller's own orders, newest first.
pub async fn list_orders(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
) -> Result<Json<Vec<OrderResponse>>, AppError> {
    let orders = state
        .orders
        .list_orders(&caller.customer_ref())
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

/// GET /v1/orders/{id}
pub async fn get_order(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderResponse>, AppError> {
    let order = state
        .orders
        .get_order(order_id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .ok_or_else(|| AppError::NotFoundError(format!("Order not found: {}", order_id)))?;

    let supplier_owns_item = caller
        .supplier_id()
        .map(|sid| order.has_item_from(sid))
        .unwrap_or(false);
    let is_owner = order.customer_ref == caller.customer_ref();
    if !caller.is_admin() && !is_owner && !supplier_owns_item {
        return Err(AppError::AuthorizationError(
            "not allowed to view this order".to_string(),
        ));
    }

    Ok(Json(order.into()))
}

/// POST /v1/orders/{id}/cancel
pub async fn cancel_order(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<CancelOrderPayload>,
) -> Result<Json<OrderResponse>, AppError> {
    let order = state
        .lifecycle
        .cancel(order_id, &caller, &payload.reason, payload.notes.as_deref())
        .await?;
    Ok(Json(order.into()))
}

/// PATCH /v1/orders/{id}
/// Administrative/supplier progress update.
pub async fn update_order(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<UpdateOrderPayload>,
) -> Result<Json<OrderResponse>, AppError> {
    let status = payload
        .status
        .as_deref()
        .map(str::parse::<OrderStatus>)
        .transpose()
        .map_err(AppError::ValidationError)?;
    let shipping_status = payload
        .shipping_status
        .as_deref()
        .map(str::parse::<ShippingStatus>)
        .transpose()
        .map_err(AppError::ValidationError)?;

    let order = state
        .lifecycle
        .update(
            order_id,
            &caller,
            UpdateOrderRequest {
                status,
                shipping_status,
                tracking_number: payload.tracking_number,
                admin_notes: payload.admin_notes,
            },
        )
        .await?;
    Ok(Json(order.into()))
}
