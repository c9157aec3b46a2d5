use std::time::Duration;

use crate::retry::RetryStrategy;

/// Configuration for the [`ActionExecutor`](crate::ActionExecutor).
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Maximum number of retries after the initial attempt before an
    /// action is considered failed.
    pub max_retries: u32,
    /// Strategy used to compute the delay between retries.
    pub retry_strategy: RetryStrategy,
    /// Maximum wall-clock time allowed for a single platform call.
    pub call_timeout: Duration,
    /// Maximum number of actions that may execute concurrently, enforced
    /// via a [`tokio::sync::Semaphore`].
    pub max_concurrent: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_strategy: RetryStrategy::default(),
            call_timeout: Duration::from_secs(30),
            max_concurrent: 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_allows_three_retries() {
        let config = ExecutorConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.call_timeout, Duration::from_secs(30));
    }
}
