use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use prometheus::{Encoder, IntCounter, Registry, TextEncoder};

use crate::state::AppState;

/// Operational counters exposed at `GET /metrics`.
///
/// `settlements_deferred_total` is the alerting surface for the one
/// eventually-consistent path in the system: a successful payment whose
/// per-supplier bookkeeping failed and needs manual reconciliation.
pub struct ApiMetrics {
    registry: Registry,
    pub checkouts_total: IntCounter,
    pub settlements_deferred_total: IntCounter,
}

impl ApiMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();
        let checkouts_total = IntCounter::new(
            "vendra_checkouts_total",
            "Orders successfully created from carts",
        )
        .expect("valid counter definition");
        let settlements_deferred_total = IntCounter::new(
            "vendra_settlements_deferred_total",
            "Successful payments whose settlement split failed and awaits manual reconciliation",
        )
        .expect("valid counter definition");

        registry
            .register(Box::new(checkouts_total.clone()))
            .expect("counter registers once");
        registry
            .register(Box::new(settlements_deferred_total.clone()))
            .expect("counter registers once");

        Self {
            registry,
            checkouts_total,
            settlements_deferred_total,
        }
    }

    pub fn render(&self) -> String {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buffer) {
            tracing::error!("Failed to encode metrics: {}", e);
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

impl Default for ApiMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// GET /metrics
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_render_with_their_names() {
        let metrics = ApiMetrics::new();
        metrics.checkouts_total.inc();
        metrics.settlements_deferred_total.inc();

        let rendered = metrics.render();
        assert!(rendered.contains("vendra_checkouts_total 1"));
        assert!(rendered.contains("vendra_settlements_deferred_total 1"));
    }
}
