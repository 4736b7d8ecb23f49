use crate::models::{Order, Payment, SettlementStatus, SupplierSettlement};
use crate::repository::SettlementRepository;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum SettlementError {
    #[error("Settlement persistence failed: {0}")]
    Storage(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Round a platform commission to whole minor units.
pub fn commission_cents(gross_cents: i64, percent: f64) -> i64 {
    (gross_cents as f64 * percent / 100.0).round() as i64
}

/// Partitions a paid order's items by supplier and writes one pending
/// settlement row per supplier.
///
/// The commission percentage is platform-wide and injected at construction;
/// see DESIGN.md for why no per-supplier rate exists.
pub struct SettlementSplitter {
    settlements: Arc<dyn SettlementRepository>,
    commission_percent: f64,
}

impl SettlementSplitter {
    pub fn new(settlements: Arc<dyn SettlementRepository>, commission_percent: f64) -> Self {
        Self {
            settlements,
            commission_percent,
        }
    }

    /// Sum each supplier's share of the order. Deterministic iteration order
    /// keeps logs and tests stable.
    pub fn supplier_shares(order: &Order) -> BTreeMap<Uuid, i64> {
        let mut shares: BTreeMap<Uuid, i64> = BTreeMap::new();
        for item in &order.items {
            *shares.entry(item.supplier_id).or_insert(0) += item.total_price_cents;
        }
        shares
    }

    /// Create the settlement rows for one successful payment. Re-invocation
    /// for the same (order, payment) pair is a no-op per supplier; the full
    /// row set for the payment is returned either way.
    pub async fn split(
        &self,
        order: &Order,
        payment: &Payment,
    ) -> Result<Vec<SupplierSettlement>, SettlementError> {
        let transaction_ref = payment.transaction_id.clone().unwrap_or_default();

        for (supplier_id, gross_cents) in Self::supplier_shares(order) {
            let commission = commission_cents(gross_cents, self.commission_percent);
            let settlement = SupplierSettlement {
                id: Uuid::new_v4(),
                supplier_id,
                order_id: order.id,
                payment_id: payment.id,
                transaction_ref: transaction_ref.clone(),
                gross_cents,
                commission_cents: commission,
                net_cents: gross_cents - commission,
                status: SettlementStatus::Pending,
                created_at: Utc::now(),
            };
            let inserted = self.settlements.insert_if_absent(&settlement).await?;
            if inserted {
                tracing::info!(
                    "Settlement pending for supplier {}: gross {} commission {} net {}",
                    supplier_id,
                    gross_cents,
                    commission,
                    settlement.net_cents
                );
            } else {
                tracing::debug!(
                    "Settlement for (order {}, payment {}, supplier {}) already exists, skipping",
                    order.id,
                    payment.id,
                    supplier_id
                );
            }
        }

        Ok(self.settlements.list_by_payment(payment.id).await?)
    }
}
