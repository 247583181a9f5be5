//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::{CheckoutError, GatewayError, OrderBookError, SubmissionError};
use domain::{ConfigurationError, OrderError, ValidationError};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Request conflicts with the current state of a resource.
    Conflict(String),
    /// Access token missing, used, expired or for another restaurant.
    Forbidden(String),
    /// Cart or checkout details failed validation.
    Validation(ValidationError),
    /// Order writes stopped part way.
    Submission(SubmissionError),
    /// A backing service could not be reached.
    Unavailable(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, serde_json::json!({ "error": msg })),
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, serde_json::json!({ "error": msg }))
            }
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, serde_json::json!({ "error": msg })),
            ApiError::Forbidden(msg) => {
                (StatusCode::FORBIDDEN, serde_json::json!({ "error": msg }))
            }
            ApiError::Validation(err) => {
                let field = match &err {
                    ValidationError::MissingRequiredField(field) => Some(field.as_str()),
                    _ => None,
                };
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    serde_json::json!({
                        "error": err.to_string(),
                        "code": err.code(),
                        "field": field,
                    }),
                )
            }
            ApiError::Submission(err) => {
                tracing::error!(error = %err, stage = %err.stage, "order submission failed");
                (
                    StatusCode::BAD_GATEWAY,
                    serde_json::json!({
                        "error": err.to_string(),
                        "stage": err.stage,
                        "order_id": err.order_id.map(|id| id.to_string()),
                        "written_lines": err.written_lines.len(),
                    }),
                )
            }
            ApiError::Unavailable(msg) => {
                tracing::error!(error = %msg, "backing service unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    serde_json::json!({ "error": msg }),
                )
            }
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        ApiError::Unavailable(err.to_string())
    }
}

impl From<ConfigurationError> for ApiError {
    fn from(err: ConfigurationError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::UnknownStatus(_) | OrderError::UnknownPaymentType(_) => {
                ApiError::BadRequest(err.to_string())
            }
            OrderError::InvalidStatusTransition { .. }
            | OrderError::InvalidCompositionTransition { .. }
            | OrderError::CustomerLocked => ApiError::Conflict(err.to_string()),
        }
    }
}

impl From<OrderBookError> for ApiError {
    fn from(err: OrderBookError) -> Self {
        match err {
            OrderBookError::NotFound(id) => ApiError::NotFound(format!("Order {id} not found")),
            OrderBookError::Order(err) => err.into(),
            OrderBookError::Gateway(err) => err.into(),
        }
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::Validation(err) => ApiError::Validation(err),
            CheckoutError::Submission(err) => ApiError::Submission(err),
            CheckoutError::Configuration(err) => err.into(),
            CheckoutError::InvalidAccessToken | CheckoutError::AccessTokenScopeMismatch => {
                ApiError::Forbidden(err.to_string())
            }
            CheckoutError::Order(err) => err.into(),
            CheckoutError::Gateway(err) => err.into(),
        }
    }
}
