use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vendra_cart::cart::{Cart, CartItem};
use vendra_core::identity::CallerIdentity;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: i32,
}

#[derive(Debug, Serialize)]
pub struct CartItemResponse {
    pub product_id: Uuid,
    pub name: String,
    pub sku: String,
    pub image_url: Option<String>,
    pub unit_price_cents: i64,
    pub quantity: i32,
    pub line_total_cents: i64,
}

impl From<CartItem> for CartItemResponse {
    fn from(item: CartItem) -> Self {
        let line_total_cents = item.line_total_cents();
        Self {
            product_id: item.product_id,
            name: item.name,
            sku: item.sku,
            image_url: item.image_url,
            unit_price_cents: item.unit_price_cents,
            quantity: item.quantity,
            line_total_cents,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub items: Vec<CartItemResponse>,
    pub subtotal_cents: i64,
}

impl From<Cart> for CartResponse {
    fn from(cart: Cart) -> Self {
        Self {
            subtotal_cents: cart.subtotal_cents,
            items: cart.items.into_iter().map(CartItemResponse::from).collect(),
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /v1/cart
pub async fn get_cart(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
) -> Result<Json<CartResponse>, AppError> {
    let cart = state.cart.get_cart(&caller.cart_key()).await?;
    Ok(Json(cart.into()))
}

/// POST /v1/cart/items
pub async fn add_item(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<CartItemResponse>, AppError> {
    let item = state
        .cart
        .add_item(&caller.cart_key(), req.product_id, req.quantity)
        .await?;
    Ok(Json(item.into()))
}

/// PUT /v1/cart/items/{product_id}
pub async fn update_item(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(product_id): Path<Uuid>,
    Json(req): Json<UpdateQuantityRequest>,
) -> Result<Json<CartItemResponse>, AppError> {
    let item = state
        .cart
        .update_quantity(&caller.cart_key(), product_id, req.quantity)
        .await?;
    Ok(Json(item.into()))
}

/// DELETE /v1/cart/items/{product_id}
pub async fn remove_item(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(product_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .cart
        .remove_item(&caller.cart_key(), product_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /v1/cart
pub async fn clear_cart(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
) -> Result<StatusCode, AppError> {
    state.cart.clear(&caller.cart_key()).await?;
    Ok(StatusCode::NO_CONTENT)
}
