use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vendra_core::identity::CallerIdentity;
use vendra_order::models::{Payment, SupplierSettlement};
use vendra_order::reconcile::{RecordPaymentRequest, SettlementOutcome};

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RecordPaymentPayload {
    /// Required when the order spans several suppliers; the caller then
    /// records one payment per supplier.
    pub supplier_id: Option<Uuid>,
    pub token: String,
    pub amount_cents: i64,
    pub currency: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub id: Uuid,
    pub order_id: Uuid,
    pub supplier_id: Uuid,
    pub transaction_id: Option<String>,
    pub amount_cents: i64,
    pub fee_cents: i64,
    pub net_cents: i64,
    pub currency: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<Payment> for PaymentResponse {
    fn from(payment: Payment) -> Self {
        Self {
            id: payment.id,
            order_id: payment.order_id,
            supplier_id: payment.supplier_id,
            transaction_id: payment.transaction_id,
            amount_cents: payment.amount_cents,
            fee_cents: payment.fee_cents,
            net_cents: payment.net_cents,
            currency: payment.currency,
            status: payment.status.as_str().to_string(),
            created_at: payment.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SettlementResponse {
    pub supplier_id: Uuid,
    pub gross_cents: i64,
    pub commission_cents: i64,
    pub net_cents: i64,
    pub status: String,
}

impl From<SupplierSettlement> for SettlementResponse {
    fn from(row: SupplierSettlement) -> Self {
        Self {
            supplier_id: row.supplier_id,
            gross_cents: row.gross_cents,
            commission_cents: row.commission_cents,
            net_cents: row.net_cents,
            status: row.status.as_str().to_string(),
        }
    }
}

/// Two-phase payment result: the charge itself, and whether the per-supplier
/// settlement bookkeeping completed or was deferred for manual reconciliation.
#[derive(Debug, Serialize)]
pub struct PaymentOutcomeResponse {
    pub payment: PaymentResponse,
    pub settlement_status: String,
    pub settlements: Vec<SettlementResponse>,
    pub deferred_reason: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/orders/{id}/payments
/// Record the result of an external charge against an order.
pub async fn record_payment(
    State(state): State<AppState>,
    Extension(_caller): Extension<CallerIdentity>,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<RecordPaymentPayload>,
) -> Result<Json<PaymentOutcomeResponse>, AppError> {
    let outcome = state
        .payments
        .record_payment(RecordPaymentRequest {
            order_id,
            supplier_id: payload.supplier_id,
            gateway_token: payload.token,
            amount_cents: payload.amount_cents,
            currency: payload.currency,
            email: payload.email,
        })
        .await?;

    let (settlement_status, settlements, deferred_reason) = match outcome.settlement {
        SettlementOutcome::Completed(rows) => (
            "COMPLETED".to_string(),
            rows.into_iter().map(SettlementResponse::from).collect(),
            None,
        ),
        SettlementOutcome::Deferred { reason } => {
            state.metrics.settlements_deferred_total.inc();
            ("DEFERRED".to_string(), Vec::new(), Some(reason))
        }
    };

    Ok(Json(PaymentOutcomeResponse {
        payment: outcome.payment.into(),
        settlement_status,
        settlements,
        deferred_reason,
    }))
}
