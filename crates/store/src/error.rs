use checkout::{GatewayError, OrderBookError};
use thiserror::Error;

/// Errors that can occur when talking to PostgreSQL.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored row could not be turned back into a domain value.
    #[error("Corrupt row in {table}: {message}")]
    Corrupt { table: &'static str, message: String },
}

impl StoreError {
    pub(crate) fn corrupt(table: &'static str, message: impl std::fmt::Display) -> Self {
        StoreError::Corrupt {
            table,
            message: message.to_string(),
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::Database(sqlx::Error::Database(_)) => "constraint",
            StoreError::Database(_) => "connection",
            StoreError::Migration(_) => "migration",
            StoreError::Corrupt { .. } => "corrupt",
        }
    }
}

impl From<StoreError> for GatewayError {
    fn from(error: StoreError) -> Self {
        metrics::counter!("store_errors_total", "kind" => error.kind()).increment(1);
        match error {
            StoreError::Database(sqlx::Error::Database(db_err)) => {
                if db_err.is_foreign_key_violation() {
                    GatewayError::MissingReference(db_err.message().to_string())
                } else {
                    GatewayError::Rejected(db_err.message().to_string())
                }
            }
            corrupt @ StoreError::Corrupt { .. } => GatewayError::Corrupt(corrupt.to_string()),
            other => GatewayError::Unavailable(other.to_string()),
        }
    }
}

impl From<StoreError> for OrderBookError {
    fn from(error: StoreError) -> Self {
        OrderBookError::Gateway(error.into())
    }
}

/// Result type for store operations.
pub type Result<T, E = StoreError> = std::result::Result<T, E>;
