use thiserror::Error;

use adpilot_audit::AuditError;
use adpilot_core::{AdpilotError, RuleId};
use adpilot_executor::ExecutorError;
use adpilot_platform::PlatformError;
use adpilot_store::StoreError;

/// Errors surfaced by run orchestration.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The rule already has an active run; the trigger is rejected.
    #[error("rule {0} already has a run in progress")]
    RunInProgress(RuleId),

    /// The referenced rule does not exist.
    #[error("rule not found: {0}")]
    RuleNotFound(RuleId),

    /// A fatal platform error aborted the run.
    #[error("run aborted: {0}")]
    Aborted(PlatformError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Audit(#[from] AuditError),

    #[error(transparent)]
    Core(#[from] AdpilotError),
}

impl From<ExecutorError> for EngineError {
    fn from(err: ExecutorError) -> Self {
        match err {
            ExecutorError::Fatal(e) => Self::Aborted(e),
            ExecutorError::Audit(e) => Self::Audit(e),
            ExecutorError::Store(e) => Self::Store(e),
        }
    }
}
