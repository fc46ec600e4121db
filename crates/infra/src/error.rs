//! Engine error model.
//!
//! Domain failures pass through unchanged; everything the store itself
//! reports becomes `InventoryError::Store`.

use thiserror::Error;

use stockroom_core::DomainError;

pub type InventoryResult<T> = Result<T, InventoryError>;

#[derive(Debug, Error)]
pub enum InventoryError {
    /// Validation, reference or uniqueness failure. Nothing was written.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The underlying transaction, query or commit failed.
    #[error("store failure in {operation}: {message}")]
    Store {
        operation: &'static str,
        message: String,
    },
}

impl InventoryError {
    pub fn store(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Store {
            operation,
            message: message.into(),
        }
    }

    /// The domain error, if this is one.
    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            Self::Domain(err) => Some(err),
            Self::Store { .. } => None,
        }
    }

    pub fn is_store_failure(&self) -> bool {
        matches!(self, Self::Store { .. })
    }
}

/// Map a sqlx error into a store failure tagged with the failing operation.
pub(crate) fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> InventoryError {
    match err {
        sqlx::Error::Database(db_err) => {
            let code = db_err.code().map(|c| c.into_owned()).unwrap_or_default();
            InventoryError::store(
                operation,
                format!("database error (code {code}): {}", db_err.message()),
            )
        }
        sqlx::Error::PoolClosed => InventoryError::store(operation, "connection pool closed"),
        sqlx::Error::PoolTimedOut => {
            InventoryError::store(operation, "timed out waiting for a pooled connection")
        }
        sqlx::Error::RowNotFound => InventoryError::store(operation, "unexpected row not found"),
        other => InventoryError::store(operation, format!("sqlx error: {other}")),
    }
}

/// Check if an error is a unique constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}
