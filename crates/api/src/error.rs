//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{CartError, DomainError, OrderError};
use store::StoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Domain logic error.
    Domain(DomainError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    match &err {
        DomainError::BookNotFound(_)
        | DomainError::AuthorNotFound(_)
        | DomainError::CategoryNotFound(_)
        | DomainError::CartItemNotFound(_)
        | DomainError::OrderNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        DomainError::Order(order_err) => match order_err {
            OrderError::EmptyCart | OrderError::InvalidStatus(_) => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            OrderError::InvalidTransition { .. } => (StatusCode::CONFLICT, err.to_string()),
        },
        DomainError::Cart(CartError::QuantityExceedsStock { .. }) => {
            (StatusCode::CONFLICT, err.to_string())
        }
        DomainError::Store(StoreError::InsufficientStock { .. }) => {
            (StatusCode::CONFLICT, err.to_string())
        }
        DomainError::Store(_) => {
            tracing::error!(error = %err, "store failure");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}
