use std::time::Duration;

/// Strategy for computing the delay before a retry attempt.
///
/// Computed delays never exceed the configured maximum.
#[derive(Debug, Clone)]
pub enum RetryStrategy {
    /// Exponential backoff: `base * multiplier^attempt`, optionally with
    /// deterministic jitter.
    Exponential {
        /// Initial delay before the first retry.
        base: Duration,
        /// Upper bound on the computed delay.
        max: Duration,
        /// Factor applied on each successive attempt.
        multiplier: f64,
        /// When `true`, a deterministic jitter factor spreads retries so
        /// concurrent runs against the same account do not all hit the
        /// rate limiter at the same instant.
        jitter: bool,
    },
    /// Fixed delay between every retry attempt. Used by tests.
    Fixed {
        /// The fixed delay duration.
        delay: Duration,
    },
}

impl RetryStrategy {
    /// Compute the delay duration for the given zero-based `attempt`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self {
            Self::Exponential {
                base,
                max,
                multiplier,
                jitter,
            } => {
                // `attempt` is a small retry count, far below i32::MAX.
                #[allow(clippy::cast_possible_wrap)]
                let raw = base.as_secs_f64() * multiplier.powi(attempt as i32);
                let adjusted = if *jitter {
                    // Deterministic jitter: +0% to +40% based on the attempt
                    // number, no RNG required.
                    raw * (1.0 + 0.1 * f64::from(attempt % 5))
                } else {
                    raw
                };
                Duration::from_secs_f64(adjusted.min(max.as_secs_f64()))
            }
            Self::Fixed { delay } => *delay,
        }
    }
}

impl Default for RetryStrategy {
    fn default() -> Self {
        Self::Exponential {
            base: Duration::from_millis(500),
            max: Duration::from_secs(60),
            multiplier: 2.0,
            jitter: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_doubles_without_jitter() {
        let strategy = RetryStrategy::Exponential {
            base: Duration::from_millis(500),
            max: Duration::from_secs(60),
            multiplier: 2.0,
            jitter: false,
        };
        assert_eq!(strategy.delay_for(0), Duration::from_millis(500));
        assert_eq!(strategy.delay_for(1), Duration::from_secs(1));
        assert_eq!(strategy.delay_for(2), Duration::from_secs(2));
    }

    #[test]
    fn exponential_is_clamped_to_max() {
        let strategy = RetryStrategy::Exponential {
            base: Duration::from_secs(1),
            max: Duration::from_secs(4),
            multiplier: 3.0,
            jitter: false,
        };
        assert_eq!(strategy.delay_for(0), Duration::from_secs(1));
        assert_eq!(strategy.delay_for(1), Duration::from_secs(3));
        assert_eq!(strategy.delay_for(2), Duration::from_secs(4));
        assert_eq!(strategy.delay_for(9), Duration::from_secs(4));
    }

    #[test]
    fn jitter_is_deterministic() {
        let strategy = RetryStrategy::Exponential {
            base: Duration::from_millis(100),
            max: Duration::from_secs(60),
            multiplier: 2.0,
            jitter: true,
        };
        // attempt 1: 200ms * 1.1 = 220ms, same on every call.
        assert_eq!(strategy.delay_for(1), Duration::from_millis(220));
        assert_eq!(strategy.delay_for(1), Duration::from_millis(220));
    }

    #[test]
    fn fixed_is_constant() {
        let strategy = RetryStrategy::Fixed {
            delay: Duration::from_millis(250),
        };
        for attempt in 0..5 {
            assert_eq!(strategy.delay_for(attempt), Duration::from_millis(250));
        }
    }
}
