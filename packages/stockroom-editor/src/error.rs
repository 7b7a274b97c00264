//! Editor error types.

use thiserror::Error;

use stockroom_client::ClientError;
use stockroom_core::GridError;

/// Errors returned before or instead of an edit outcome.
///
/// Failures of an optimistic edit's own request are not errors: they are
/// reported as a rollback in [`crate::EditOutcome`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditorError {
    /// Schema, row or reference lookup failed
    #[error(transparent)]
    Grid(#[from] GridError),

    /// Collaborator request failed
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Collaborator answered with an unusable body
    #[error("Invalid response for {operation}: {message}")]
    InvalidResponse {
        operation: &'static str,
        message: String,
    },
}

/// Result type for editor operations.
pub type Result<T> = std::result::Result<T, EditorError>;
