use std::time::Duration;

use thiserror::Error;

/// Errors returned by the external ad-platform and attribution clients.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The entity does not exist on the platform.
    #[error("entity not found: {0}")]
    NotFound(String),

    /// The platform rejected the request as malformed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Authentication or authorization failed. Fatal: the whole run aborts.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// HTTP 429 from the platform.
    #[error("rate limited")]
    RateLimited,

    /// HTTP 5xx from the platform.
    #[error("server error: {0}")]
    ServerError(String),

    /// The call did not complete within the allowed duration.
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    /// A network or transport-level error occurred.
    #[error("connection error: {0}")]
    Connection(String),
}

impl PlatformError {
    /// Returns `true` if the error is transient and the call may succeed on
    /// retry (429, 5xx, timeout, network failure).
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::ServerError(_) | Self::Timeout(_) | Self::Connection(_)
        )
    }

    /// Returns `true` if the error must abort the entire run instead of
    /// failing a single entity.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::AuthFailed(_))
    }
}
