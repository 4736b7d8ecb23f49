use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Charge status as reported by the external provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChargeStatus {
    Succeeded,
    Failed,
}

/// The result of one charge attempt at the external gateway.
///
/// Amounts are minor currency units (integer cents); the gateway never sees
/// decimals. `raw` is the provider's payload, kept verbatim for audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayCharge {
    pub id: String, // Provider's ID (e.g., ch_123)
    pub status: ChargeStatus,
    pub fee_cents: Option<i64>,
    pub net_cents: Option<i64>,
    pub failure_message: Option<String>,
    pub raw: serde_json::Value,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a charge with the provider.
    async fn create_charge(
        &self,
        amount_cents: i64,
        currency: &str,
        token: &str,
        metadata: serde_json::Value,
    ) -> Result<GatewayCharge, Box<dyn std::error::Error + Send + Sync>>;
}

/// Gateway stand-in for tests and local development.
///
/// Magic tokens drive the outcome: `tok_declined` yields a failed charge,
/// `tok_unreachable` simulates a provider outage.
pub struct MockPaymentGateway;

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_charge(
        &self,
        amount_cents: i64,
        currency: &str,
        token: &str,
        metadata: serde_json::Value,
    ) -> Result<GatewayCharge, Box<dyn std::error::Error + Send + Sync>> {
        if token == "tok_unreachable" {
            return Err("simulated payment gateway outage".into());
        }

        tracing::info!("Mock gateway charging {} {} minor units", amount_cents, currency);
        let charge_id = format!("ch_{}", Uuid::new_v4().simple());

        if token == "tok_declined" {
            return Ok(GatewayCharge {
                id: charge_id.clone(),
                status: ChargeStatus::Failed,
                fee_cents: None,
                net_cents: None,
                failure_message: Some("card declined".to_string()),
                raw: serde_json::json!({
                    "id": charge_id,
                    "status": "failed",
                    "failure_message": "card declined",
                    "metadata": metadata,
                }),
            });
        }

        // Flat mock fee schedule: 2.9% + 30 minor units.
        let fee_cents = amount_cents * 29 / 1000 + 30;
        Ok(GatewayCharge {
            id: charge_id.clone(),
            status: ChargeStatus::Succeeded,
            fee_cents: Some(fee_cents),
            net_cents: Some(amount_cents - fee_cents),
            failure_message: None,
            raw: serde_json::json!({
                "id": charge_id,
                "status": "succeeded",
                "amount": amount_cents,
                "currency": currency,
                "fee": fee_cents,
                "metadata": metadata,
            }),
        })
    }
}
