use axum::{
    extract::{ConnectInfo, State},
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod cart;
pub mod error;
pub mod metrics;
pub mod orders;
pub mod payments;
pub mod state;
pub mod suppliers;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::HeaderName::from_static("x-session-id"),
        ]);

    // Everything under /v1 requires a resolved caller identity.
    let api = Router::new()
        .route("/v1/cart", get(cart::get_cart).delete(cart::clear_cart))
        .route("/v1/cart/items", post(cart::add_item))
        .route(
            "/v1/cart/items/{product_id}",
            axum::routing::put(cart::update_item).delete(cart::remove_item),
        )
        .route("/v1/checkout", post(orders::checkout))
        .route("/v1/orders", get(orders::list_orders))
        .route(
            "/v1/orders/{id}",
            get(orders::get_order).patch(orders::update_order),
        )
        .route("/v1/orders/{id}/cancel", post(orders::cancel_order))
        .route("/v1/orders/{id}/payments", post(payments::record_payment))
        .route(
            "/v1/suppliers/{id}/dashboard",
            get(suppliers::supplier_dashboard),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::identity_middleware,
        ));

    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics::metrics_handler))
        .merge(api)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Fixed-window rate limit keyed by client IP. Fails open: losing rate
/// limiting briefly beats refusing traffic when Redis is down.
async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let Some(redis) = &state.redis else {
        return next.run(req).await;
    };

    let ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|c| c.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let key = format!("ratelimit:{}", ip);

    match redis
        .check_rate_limit(&key, state.rate_limit_per_minute, 60)
        .await
    {
        Ok(true) => next.run(req).await,
        Ok(false) => {
            (StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded").into_response()
        }
        Err(e) => {
            tracing::warn!("Rate limit check failed, allowing request: {}", e);
            next.run(req).await
        }
    }
}
