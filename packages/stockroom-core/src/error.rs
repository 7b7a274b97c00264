//! Data model error types.

use thiserror::Error;

use crate::value::Pk;

/// Errors raised while resolving schemas, paths and rows.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
    /// Resource schema not registered
    #[error("Resource '{resource}' not found")]
    ResourceNotFound { resource: String },

    /// Resource schema registered twice
    #[error("Resource '{0}' already registered")]
    ResourceAlreadyRegistered(String),

    /// Field path not declared by the resource schema
    #[error("Field '{field}' not found in resource '{resource}'")]
    FieldNotFound { resource: String, field: String },

    /// Field declared twice in one schema
    #[error("Field '{field}' already exists in resource '{resource}'")]
    FieldAlreadyExists { resource: String, field: String },

    /// Field is derived or an identifier and cannot be edited
    #[error("Field '{field}' of resource '{resource}' is read-only")]
    FieldReadOnly { resource: String, field: String },

    /// Malformed dotted field path
    #[error("Invalid field path '{0}'")]
    InvalidPath(String),

    /// Cell value does not fit the field kind
    #[error("Type mismatch for field '{field}': expected {expected}, got {got}")]
    TypeMismatch {
        field: String,
        expected: String,
        got: String,
    },

    /// Row index outside the current collection
    #[error("Row index {index} out of range (len {len})")]
    RowOutOfRange { index: usize, len: usize },

    /// No row with the given primary key
    #[error("Row with pk {0} not found")]
    RowNotFound(Pk),

    /// Record is not an object or carries no unsigned `pk`
    #[error("Record is missing primary key '{0}'")]
    MissingPk(String),

    /// Display name not present in a side-loaded reference list
    #[error("Reference '{name}' not found in '{resource}'")]
    UnknownReference { resource: String, name: String },

    /// Lock poisoned (RwLock poisoned)
    #[error("Lock poisoned")]
    LockPoisoned,

    /// Malformed list query string
    #[error("Invalid query parameter '{key}': {message}")]
    InvalidQuery { key: String, message: String },
}

/// Result type for data model operations.
pub type Result<T> = std::result::Result<T, GridError>;
