use crate::models::{Order, OrderPaymentStatus, Payment, PaymentRecordStatus, SupplierSettlement};
use crate::repository::{OrderRepository, PaymentRepository};
use crate::settlement::SettlementSplitter;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;
use vendra_catalog::supplier::{SupplierResolution, SupplierResolutionError};
use vendra_core::payment::{ChargeStatus, PaymentGateway};
use vendra_shared::models::events::SettlementDeferredEvent;
use vendra_shared::pii::Masked;

#[derive(Debug, Clone)]
pub struct RecordPaymentRequest {
    pub order_id: Uuid,
    /// Explicit supplier for orders spanning several vendors; inferred from
    /// the order's items when omitted.
    pub supplier_id: Option<Uuid>,
    pub gateway_token: String,
    pub amount_cents: i64,
    pub currency: String,
    pub email: String,
}

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("Invalid payment request: {0}")]
    Validation(String),

    #[error("Order not found: {0}")]
    OrderNotFound(Uuid),

    #[error("Order spans {0} suppliers; record one payment per supplier")]
    MultiSupplierOrder(usize),

    #[error(transparent)]
    SupplierResolution(#[from] SupplierResolutionError),

    #[error("Payment declined: {0}")]
    GatewayDeclined(String),

    #[error("Payment gateway unavailable: {0}")]
    GatewayUnavailable(String),

    #[error("Payment persistence failed: {0}")]
    Storage(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Settlement half of a payment result. `Deferred` means the charge went
/// through but the per-supplier bookkeeping did not; the money is safe and a
/// later reconciliation run picks the rows up.
#[derive(Debug)]
pub enum SettlementOutcome {
    Completed(Vec<SupplierSettlement>),
    Deferred { reason: String },
}

/// Two-phase result of recording a payment, so callers can distinguish
/// "paid, settlement pending" from full success.
#[derive(Debug)]
pub struct PaymentOutcome {
    pub payment: Payment,
    pub settlement: SettlementOutcome,
}

/// Records the result of an external charge against an order and triggers
/// settlement splitting on success.
pub struct PaymentReconciliation {
    orders: Arc<dyn OrderRepository>,
    payments: Arc<dyn PaymentRepository>,
    gateway: Arc<dyn PaymentGateway>,
    suppliers: Arc<dyn SupplierResolution>,
    splitter: SettlementSplitter,
}

impl PaymentReconciliation {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        payments: Arc<dyn PaymentRepository>,
        gateway: Arc<dyn PaymentGateway>,
        suppliers: Arc<dyn SupplierResolution>,
        splitter: SettlementSplitter,
    ) -> Self {
        Self {
            orders,
            payments,
            gateway,
            suppliers,
            splitter,
        }
    }

    pub async fn record_payment(
        &self,
        req: RecordPaymentRequest,
    ) -> Result<PaymentOutcome, PaymentError> {
        // 1. Validate before any side effect
        if req.gateway_token.trim().is_empty() {
            return Err(PaymentError::Validation(
                "gateway token is required".to_string(),
            ));
        }
        if req.amount_cents <= 0 {
            return Err(PaymentError::Validation(
                "amount must be positive".to_string(),
            ));
        }
        if req.currency.trim().is_empty() {
            return Err(PaymentError::Validation("currency is required".to_string()));
        }

        let order = self
            .orders
            .get_order(req.order_id)
            .await?
            .ok_or(PaymentError::OrderNotFound(req.order_id))?;

        // 2. Resolve the supplier this payment belongs to
        let requested_supplier = match req.supplier_id {
            Some(id) => id,
            None => infer_supplier(&order)?,
        };
        let supplier_id = self.suppliers.resolve(requested_supplier).await?;

        // 3. Create the charge with the external gateway
        let metadata = serde_json::json!({
            "order_id": order.id,
            "order_number": order.order_number,
            "email": req.email,
        });
        let charge = match self
            .gateway
            .create_charge(
                req.amount_cents,
                &req.currency,
                &req.gateway_token,
                metadata,
            )
            .await
        {
            Ok(charge) => charge,
            Err(e) => {
                // Provider unreachable. Record the attempt anyway so the
                // audit trail shows it, then surface the gateway error.
                let payment = Payment {
                    id: Uuid::new_v4(),
                    order_id: order.id,
                    supplier_id,
                    transaction_id: None,
                    amount_cents: req.amount_cents,
                    fee_cents: 0,
                    net_cents: 0,
                    currency: req.currency.clone(),
                    status: PaymentRecordStatus::Failed,
                    failure_message: Some(e.to_string()),
                    raw_response: serde_json::json!({ "error": e.to_string() }),
                    created_at: Utc::now(),
                };
                self.payments.insert_payment(&payment).await?;
                return Err(PaymentError::GatewayUnavailable(e.to_string()));
            }
        };

        // 4. Persist the attempt with the provider's own status and payload
        if charge.status == ChargeStatus::Failed {
            let message = charge
                .failure_message
                .clone()
                .unwrap_or_else(|| "charge failed".to_string());
            let payment = Payment {
                id: Uuid::new_v4(),
                order_id: order.id,
                supplier_id,
                transaction_id: Some(charge.id),
                amount_cents: req.amount_cents,
                fee_cents: 0,
                net_cents: 0,
                currency: req.currency.clone(),
                status: PaymentRecordStatus::Failed,
                failure_message: Some(message.clone()),
                raw_response: charge.raw,
                created_at: Utc::now(),
            };
            self.payments.insert_payment(&payment).await?;
            return Err(PaymentError::GatewayDeclined(message));
        }

        let fee_cents = charge.fee_cents.unwrap_or(0);
        let net_cents = charge.net_cents.unwrap_or(req.amount_cents - fee_cents);
        let payment = Payment {
            id: Uuid::new_v4(),
            order_id: order.id,
            supplier_id,
            transaction_id: Some(charge.id),
            amount_cents: req.amount_cents,
            fee_cents,
            net_cents,
            currency: req.currency.clone(),
            status: PaymentRecordStatus::Succeeded,
            failure_message: None,
            raw_response: charge.raw,
            created_at: Utc::now(),
        };
        self.payments.insert_payment(&payment).await?;
        self.orders
            .set_payment_status(order.id, OrderPaymentStatus::Paid)
            .await?;

        let event = vendra_shared::models::events::PaymentRecordedEvent {
            payment_id: payment.id,
            order_id: order.id,
            supplier_id,
            amount_cents: payment.amount_cents,
            succeeded: true,
            customer_email: Masked(req.email.clone()),
            timestamp: Utc::now().timestamp(),
        };
        tracing::info!(event = ?event, "Payment recorded");

        // 5. Best-effort settlement split. A failure here is logged and
        //    reported as Deferred; it never rolls back the payment.
        let settlement = match self.splitter.split(&order, &payment).await {
            Ok(rows) => SettlementOutcome::Completed(rows),
            Err(e) => {
                let deferred = SettlementDeferredEvent {
                    order_id: order.id,
                    payment_id: payment.id,
                    reason: e.to_string(),
                    timestamp: Utc::now().timestamp(),
                };
                tracing::error!(
                    event = ?deferred,
                    "Settlement creation failed after successful payment; manual reconciliation required"
                );
                SettlementOutcome::Deferred {
                    reason: e.to_string(),
                }
            }
        };

        Ok(PaymentOutcome {
            payment,
            settlement,
        })
    }
}

/// Infer the paid supplier from the order's items. Fails when items span
/// more than one supplier; the caller must then split the payment.
fn infer_supplier(order: &Order) -> Result<Uuid, PaymentError> {
    let distinct = order.distinct_supplier_ids();
    match distinct.len() {
        0 => Err(PaymentError::Validation(
            "order has no items to pay for".to_string(),
        )),
        1 => Ok(distinct[0]),
        n => Err(PaymentError::MultiSupplierOrder(n)),
    }
}
