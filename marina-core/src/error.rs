//! Error types for Marina operations

use crate::identity::{BoatId, EntityKind, LoadId, RawId};
use thiserror::Error;

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Storage backend failed during {operation}: {reason}")]
    Backend { operation: String, reason: String },

    #[error("Stored {kind} {id} could not be decoded: {reason}")]
    Corrupt {
        kind: EntityKind,
        id: RawId,
        reason: String,
    },

    #[error("Could not encode {kind} document: {reason}")]
    Encode { kind: EntityKind, reason: String },

    #[error("Id sequence exhausted")]
    IdsExhausted,
}

impl StorageError {
    pub fn backend(operation: impl Into<String>, reason: impl ToString) -> Self {
        Self::Backend {
            operation: operation.into(),
            reason: reason.to_string(),
        }
    }
}

/// Validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Value for {field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("Update must change at least one field")]
    EmptyUpdate,
}

impl ValidationError {
    pub fn missing(field: &str) -> Self {
        Self::RequiredFieldMissing {
            field: field.to_string(),
        }
    }

    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Illegal transitions of the load/boat relationship.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RelationshipError {
    #[error("Load {load} is already on boat {boat} and must be unloaded before it can be loaded again")]
    AlreadyAssigned { load: LoadId, boat: BoatId },

    #[error("Load {load} is not on boat {boat}")]
    NotAssigned { load: LoadId, boat: BoatId },
}

/// Master error type for Marina operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MarinaError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Relationship error: {0}")]
    Relationship(#[from] RelationshipError),

    #[error("No {kind} with id {id} exists")]
    NotFound { kind: EntityKind, id: String },

    #[error("A boat named '{name}' already exists")]
    DuplicateName { name: String },
}

impl MarinaError {
    pub fn not_found(kind: EntityKind, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type alias for Marina operations.
pub type MarinaResult<T> = Result<T, MarinaError>;
