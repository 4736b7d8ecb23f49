use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use vendra_cart::cart::CartError;
use vendra_order::checkout::CheckoutError;
use vendra_order::lifecycle::LifecycleError;
use vendra_order::metrics::DashboardError;
use vendra_order::reconcile::PaymentError;

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    AuthorizationError(String),
    ValidationError(String),
    NotFoundError(String),
    ConflictError(String),
    PaymentDeclined(String),
    GatewayError(String),
    InternalServerError(String),
    Anyhow(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::PaymentDeclined(msg) => (StatusCode::PAYMENT_REQUIRED, msg),
            AppError::GatewayError(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Anyhow(err)
    }
}

impl From<CartError> for AppError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::InvalidQuantity(_) => AppError::ValidationError(err.to_string()),
            CartError::ProductNotFound(_) => AppError::NotFoundError(err.to_string()),
            CartError::ProductUnavailable(_) => AppError::ConflictError(err.to_string()),
            CartError::ItemNotFound(_) => AppError::NotFoundError(err.to_string()),
            CartError::Storage(e) => AppError::InternalServerError(e.to_string()),
        }
    }
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::EmptyCart => AppError::ConflictError(err.to_string()),
            CheckoutError::InsufficientStock { .. } => AppError::ConflictError(err.to_string()),
            CheckoutError::ProductMissing(_) => AppError::NotFoundError(err.to_string()),
            CheckoutError::Validation(msg) => AppError::ValidationError(msg),
            CheckoutError::Storage(e) => AppError::InternalServerError(e.to_string()),
        }
    }
}

impl From<LifecycleError> for AppError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::NotFound(_) => AppError::NotFoundError(err.to_string()),
            LifecycleError::NotAuthorized(msg) => AppError::AuthorizationError(msg),
            LifecycleError::NotCancellable(reason) => AppError::ConflictError(reason.to_string()),
            LifecycleError::Storage(e) => AppError::InternalServerError(e.to_string()),
        }
    }
}

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::Validation(msg) => AppError::ValidationError(msg),
            PaymentError::OrderNotFound(_) => AppError::NotFoundError(err.to_string()),
            PaymentError::MultiSupplierOrder(_) => AppError::ConflictError(err.to_string()),
            PaymentError::SupplierResolution(_) => AppError::NotFoundError(err.to_string()),
            PaymentError::GatewayDeclined(msg) => AppError::PaymentDeclined(msg),
            PaymentError::GatewayUnavailable(msg) => AppError::GatewayError(msg),
            PaymentError::Storage(e) => AppError::InternalServerError(e.to_string()),
        }
    }
}

impl From<DashboardError> for AppError {
    fn from(err: DashboardError) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}
