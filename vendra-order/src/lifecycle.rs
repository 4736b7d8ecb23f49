use crate::models::{Order, OrderStatus, ShippingStatus};
use crate::repository::OrderRepository;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;
use vendra_core::identity::CallerIdentity;
use vendra_shared::models::events::OrderCancelledEvent;

/// Hours a customer has to cancel, depending on where the order is in its
/// lifecycle. Pending orders get the longest window; once a supplier has
/// started processing the window tightens.
pub fn cancellation_window_hours(status: OrderStatus) -> i64 {
    match status {
        OrderStatus::Pending => 48,
        OrderStatus::Processing => 12,
        _ => 24,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CancelDenied {
    #[error("Order has already been cancelled")]
    AlreadyCancelled,

    #[error("Order has already been delivered and can no longer be cancelled")]
    AlreadyDelivered,

    #[error("Order has been refunded and can no longer be cancelled")]
    AlreadyRefunded,

    #[error("Order has already shipped and can no longer be cancelled")]
    AlreadyShipped,

    #[error("The {limit_hours}-hour cancellation window for this order has passed ({elapsed_hours} hours since it was placed)")]
    WindowExpired {
        limit_hours: i64,
        elapsed_hours: i64,
    },
}

/// Cancellation eligibility. Every denial carries a human-readable reason.
pub fn can_cancel(order: &Order, now: DateTime<Utc>) -> Result<(), CancelDenied> {
    match order.status {
        OrderStatus::Cancelled => return Err(CancelDenied::AlreadyCancelled),
        OrderStatus::Delivered => return Err(CancelDenied::AlreadyDelivered),
        OrderStatus::Refunded => return Err(CancelDenied::AlreadyRefunded),
        _ => {}
    }
    match order.shipping_status {
        ShippingStatus::Shipped => return Err(CancelDenied::AlreadyShipped),
        ShippingStatus::Delivered => return Err(CancelDenied::AlreadyDelivered),
        ShippingStatus::NotShipped => {}
    }

    let limit_hours = cancellation_window_hours(order.status);
    let elapsed = now - order.order_date;
    if elapsed > Duration::hours(limit_hours) {
        return Err(CancelDenied::WindowExpired {
            limit_hours,
            elapsed_hours: elapsed.num_hours(),
        });
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("Order not found: {0}")]
    NotFound(Uuid),

    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    #[error(transparent)]
    NotCancellable(#[from] CancelDenied),

    #[error("Order update failed: {0}")]
    Storage(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Administrative/supplier update of order progress.
#[derive(Debug, Clone, Default)]
pub struct UpdateOrderRequest {
    pub status: Option<OrderStatus>,
    pub shipping_status: Option<ShippingStatus>,
    pub tracking_number: Option<String>,
    pub admin_notes: Option<String>,
}

/// Governs status transitions and cancellation over persisted orders.
pub struct OrderLifecycle {
    orders: Arc<dyn OrderRepository>,
}

impl OrderLifecycle {
    pub fn new(orders: Arc<dyn OrderRepository>) -> Self {
        Self { orders }
    }

    /// Cancel an order on behalf of its owner. Re-validates eligibility,
    /// then restores every line's stock and stamps `cancelled_date` in one
    /// atomic commit. A repeated attempt fails on the eligibility check, so
    /// stock is never restored twice.
    pub async fn cancel(
        &self,
        order_id: Uuid,
        caller: &CallerIdentity,
        reason: &str,
        notes: Option<&str>,
    ) -> Result<Order, LifecycleError> {
        let mut order = self
            .orders
            .get_order(order_id)
            .await?
            .ok_or(LifecycleError::NotFound(order_id))?;

        if !caller.is_admin() && order.customer_ref != caller.customer_ref() {
            return Err(LifecycleError::NotAuthorized(
                "only the order's owner may cancel it".to_string(),
            ));
        }

        let now = Utc::now();
        can_cancel(&order, now)?;

        order.status = OrderStatus::Cancelled;
        if order.cancelled_date.is_none() {
            order.cancelled_date = Some(now);
        }
        order.cancel_reason = Some(reason.to_string());
        order.cancel_notes = notes.map(|n| n.to_string());

        self.orders.commit_cancellation(&order).await?;

        let event = OrderCancelledEvent {
            order_id: order.id,
            customer_ref: order.customer_ref.clone(),
            reason: reason.to_string(),
            restocked_units: order.items.iter().map(|i| i.quantity).sum(),
            timestamp: now.timestamp(),
        };
        tracing::info!(event = ?event, "Order cancelled");

        Ok(order)
    }

    /// Move an order through its lifecycle. Requires the admin role or a
    /// supplier with at least one item in the order. Transition timestamps
    /// are stamped only on first entry into a status; re-applying the same
    /// status never resets them.
    pub async fn update(
        &self,
        order_id: Uuid,
        caller: &CallerIdentity,
        req: UpdateOrderRequest,
    ) -> Result<Order, LifecycleError> {
        let mut order = self
            .orders
            .get_order(order_id)
            .await?
            .ok_or(LifecycleError::NotFound(order_id))?;

        let supplier_owns_item = caller
            .supplier_id()
            .map(|sid| order.has_item_from(sid))
            .unwrap_or(false);
        if !caller.is_admin() && !supplier_owns_item {
            return Err(LifecycleError::NotAuthorized(
                "requires the admin role or a supplier with items in this order".to_string(),
            ));
        }

        let now = Utc::now();
        if let Some(status) = req.status {
            order.status = status;
            match status {
                OrderStatus::Processing => {
                    order.processing_date.get_or_insert(now);
                }
                OrderStatus::Shipped => {
                    order.shipped_date.get_or_insert(now);
                }
                OrderStatus::Delivered => {
                    order.delivered_date.get_or_insert(now);
                }
                OrderStatus::Cancelled => {
                    order.cancelled_date.get_or_insert(now);
                }
                OrderStatus::Pending | OrderStatus::Refunded => {}
            }
        }
        if let Some(shipping_status) = req.shipping_status {
            order.shipping_status = shipping_status;
            match shipping_status {
                ShippingStatus::Shipped => {
                    order.shipped_date.get_or_insert(now);
                }
                ShippingStatus::Delivered => {
                    order.delivered_date.get_or_insert(now);
                }
                ShippingStatus::NotShipped => {}
            }
        }
        if let Some(tracking) = req.tracking_number {
            order.tracking_number = Some(tracking);
        }
        if let Some(notes) = req.admin_notes {
            order.admin_notes = Some(notes);
        }

        self.orders.update_order(&order).await?;
        tracing::info!(
            "Order {} updated to status={:?} shipping={:?}",
            order.order_number,
            order.status,
            order.shipping_status
        );
        Ok(order)
    }
}
