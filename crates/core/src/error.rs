use thiserror::Error;

use crate::run::RunStatus;

/// Top-level error type for the adpilot engine.
#[derive(Debug, Error)]
pub enum AdpilotError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("store error: {0}")]
    Store(String),

    #[error("platform error: {0}")]
    Platform(String),

    #[error("executor error: {0}")]
    Executor(String),

    #[error("engine error: {0}")]
    Engine(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("invalid run transition: {from:?} -> {to:?}")]
    InvalidTransition { from: RunStatus, to: RunStatus },
}

/// A rule definition was rejected at save time.
///
/// Validation runs before persistence, so none of these conditions can be
/// observed during evaluation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("unknown metric id: {0}")]
    UnknownMetric(String),

    #[error("unknown operator id: {0}")]
    UnknownOperator(String),

    #[error("rule name must not be empty")]
    EmptyName,

    #[error("priority must be positive, got {0}")]
    InvalidPriority(u32),

    #[error("change_percent must be within 1..=20, got {0}")]
    PercentOutOfRange(u32),

    #[error("duplicates_count must be within 1..=100, got {0}")]
    DuplicatesOutOfRange(u32),

    #[error("lookback_days must be at least 1, got {0}")]
    InvalidLookback(u32),

    #[error("schedule_time must be HH:MM, got {0:?}")]
    InvalidScheduleTime(String),

    #[error("budget override must be positive, got {0}")]
    InvalidBudget(f64),
}
