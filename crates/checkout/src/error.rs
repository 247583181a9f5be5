//! Checkout error types.

use common::{LineItemId, OrderId};
use domain::{ConfigurationError, OrderError, ValidationError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reported by a backend behind one of the service ports.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The backend could not be reached or failed unexpectedly.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// The backend refused the write (constraint, permission, bad data).
    #[error("write rejected: {0}")]
    Rejected(String),

    /// A referenced parent row does not exist.
    #[error("missing reference: {0}")]
    MissingReference(String),

    /// The backend returned data that could not be decoded.
    #[error("corrupt data: {0}")]
    Corrupt(String),
}

/// Which write of a submission failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SubmissionStage {
    Header,
    LineItem,
    Flavor,
    Complement,
}

impl SubmissionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStage::Header => "header",
            SubmissionStage::LineItem => "lineItem",
            SubmissionStage::Flavor => "flavor",
            SubmissionStage::Complement => "complement",
        }
    }
}

impl std::fmt::Display for SubmissionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A submission halted part way through.
///
/// Rows written before the failure stay in place.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("order submission failed at {stage}: {cause}")]
pub struct SubmissionError {
    pub stage: SubmissionStage,
    /// Index of the plan line being written, if past the header.
    pub line_index: Option<usize>,
    /// Header already written, now without a complete set of lines.
    pub order_id: Option<OrderId>,
    /// Line items written before the failure.
    pub written_lines: Vec<LineItemId>,
    #[source]
    pub cause: GatewayError,
}

impl SubmissionError {
    /// Returns true if some rows were written before the failure.
    pub fn left_partial_order(&self) -> bool {
        self.order_id.is_some()
    }
}

/// Errors from order book administration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderBookError {
    #[error("order not found: {0}")]
    NotFound(OrderId),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Errors that can occur during checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Cart or checkout details are incomplete.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Writing the order failed part way.
    #[error(transparent)]
    Submission(#[from] SubmissionError),

    /// A line configuration does not fit the catalog.
    #[error("Invalid configuration: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Access token is unknown, used or expired.
    #[error("Access token is invalid or expired")]
    InvalidAccessToken,

    /// Access token belongs to another organization.
    #[error("Access token was issued for another restaurant")]
    AccessTokenScopeMismatch,

    /// Order-level rule violated.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// A service port failed outside of submission.
    #[error("Service error: {0}")]
    Gateway(#[from] GatewayError),
}

/// Convenience type alias for checkout results.
pub type Result<T> = std::result::Result<T, CheckoutError>;
