//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use finance::FinanceError;
use saga::SagaError;
use store::StoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Missing caller identity or webhook token.
    Unauthorized(String),
    /// Adoption saga error.
    Saga(SagaError),
    /// Payment orchestration error.
    Finance(FinanceError),
    /// Persistence error outside a saga or payment call.
    Store(StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Saga(err) => saga_error_to_response(err),
            ApiError::Finance(err) => finance_error_to_response(err),
            ApiError::Store(err) => store_error_to_response(err),
        };

        if status.is_server_error() {
            tracing::error!(%status, error = %message, "request failed");
        }

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn saga_error_to_response(err: SagaError) -> (StatusCode, String) {
    match err {
        SagaError::InvalidInput(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        SagaError::SpeciesNotFound(_)
        | SagaError::PlotNotFound(_)
        | SagaError::IntentNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        SagaError::InsufficientSpace { .. } => (StatusCode::CONFLICT, err.to_string()),
        SagaError::PaymentService(_) => (StatusCode::BAD_GATEWAY, err.to_string()),
        SagaError::Store(store) => store_error_to_response(store),
        SagaError::Bus(_) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

fn finance_error_to_response(err: FinanceError) -> (StatusCode, String) {
    match err {
        FinanceError::InvalidInput(_) | FinanceError::InvalidWebhook(_) => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        FinanceError::TransactionNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        FinanceError::Invoice(_) => (StatusCode::BAD_GATEWAY, err.to_string()),
        FinanceError::Store(store) => store_error_to_response(store),
    }
}

fn store_error_to_response(err: StoreError) -> (StatusCode, String) {
    match &err {
        StoreError::NotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        StoreError::InvalidAmount(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        StoreError::Domain(_) => (StatusCode::CONFLICT, err.to_string()),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

impl From<SagaError> for ApiError {
    fn from(err: SagaError) -> Self {
        ApiError::Saga(err)
    }
}

impl From<FinanceError> for ApiError {
    fn from(err: FinanceError) -> Self {
        ApiError::Finance(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}
