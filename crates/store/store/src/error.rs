use thiserror::Error;

use adpilot_core::ValidationError;

/// Errors from rule, whitelist, and task storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A record failed validation at save time.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A serialization or deserialization error occurred.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The backend itself failed.
    #[error("backend error: {0}")]
    Backend(String),
}
