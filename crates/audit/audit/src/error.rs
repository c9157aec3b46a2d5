use thiserror::Error;

/// Errors from change-log storage backends.
#[derive(Debug, Error)]
pub enum AuditError {
    /// A serialization or deserialization error occurred.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The backend itself failed.
    #[error("backend error: {0}")]
    Backend(String),
}
