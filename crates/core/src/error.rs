//! Domain error model.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Which kind of record a failed lookup was aimed at.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Product,
    Location,
}

impl core::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            EntityKind::Product => f.write_str("product"),
            EntityKind::Location => f.write_str("location"),
        }
    }
}

/// Domain-level error.
///
/// Deterministic business failures only (validation, references, conflicts).
/// Store failures are modelled by the infrastructure layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// An id or name did not resolve to an existing record.
    #[error("unknown {kind}: {key}")]
    NotFound { kind: EntityKind, key: String },

    /// A unique name is already registered.
    #[error("{kind} name already registered: {name}")]
    DuplicateName { kind: EntityKind, name: String },

    /// A quantity was negative (or non-positive where a positive value is required).
    #[error("invalid quantity: {0}")]
    InvalidQuantity(i64),

    /// A movement had neither a source nor a destination.
    #[error("invalid movement: {0}")]
    InvalidMovement(String),

    /// A value failed validation (e.g. blank name).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A record is still referenced by ledger entries and the active deletion
    /// policy forbids orphaning them.
    #[error("{kind} {key} is referenced by {entries} ledger entries")]
    Referenced {
        kind: EntityKind,
        key: String,
        entries: i64,
    },
}

impl DomainError {
    pub fn unknown_product(key: impl ToString) -> Self {
        Self::NotFound {
            kind: EntityKind::Product,
            key: key.to_string(),
        }
    }

    pub fn unknown_location(key: impl ToString) -> Self {
        Self::NotFound {
            kind: EntityKind::Location,
            key: key.to_string(),
        }
    }

    pub fn duplicate_name(kind: EntityKind, name: impl Into<String>) -> Self {
        Self::DuplicateName {
            kind,
            name: name.into(),
        }
    }

    pub fn invalid_movement(msg: impl Into<String>) -> Self {
        Self::InvalidMovement(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// `true` when a product reference failed to resolve.
    pub fn is_unknown_product(&self) -> bool {
        matches!(
            self,
            Self::NotFound {
                kind: EntityKind::Product,
                ..
            }
        )
    }

    /// `true` when a location reference failed to resolve.
    pub fn is_unknown_location(&self) -> bool {
        matches!(
            self,
            Self::NotFound {
                kind: EntityKind::Location,
                ..
            }
        )
    }
}
