use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AdpilotError;
use crate::types::{RuleId, RunId};

/// Which rule family a run belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleDomain {
    Disable,
    Budget,
    Scaling,
}

/// Lifecycle state of a rule run.
///
/// `Pending → Running → {Completed, Failed, Cancelled}`; the three
/// right-hand states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl RunStatus {
    /// Whether this status admits no further transitions.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Whether the state machine permits moving to `next`.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        match self {
            Self::Pending => matches!(next, Self::Running | Self::Cancelled | Self::Failed),
            Self::Running => next.is_terminal(),
            Self::Completed | Self::Failed | Self::Cancelled => false,
        }
    }
}

/// One evaluation run of a rule, tracked as a cancellable background task.
///
/// Counts maintain the invariant `completed == succeeded + failed <= total`.
/// Entity-level failures are counted but do not fail the run; only a fatal
/// platform error does.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleRun {
    /// Unique run identifier.
    pub id: RunId,
    /// The rule being evaluated.
    pub rule_id: RuleId,
    /// The rule family.
    pub domain: RuleDomain,
    /// Current lifecycle state.
    pub status: RunStatus,
    /// Completion percentage, 0–100.
    pub progress_percent: u8,
    /// Number of entities selected for action.
    pub total: u64,
    /// Entities processed so far (success or failure).
    pub completed: u64,
    /// Entities whose action succeeded.
    pub succeeded: u64,
    /// Entities whose action failed after retries.
    pub failed: u64,
    /// Operator-visible description of the current step.
    pub current_step: Option<String>,
    /// Whether mutating calls are suppressed.
    pub dry_run: bool,
    /// When the run was created.
    pub created_at: DateTime<Utc>,
    /// When the first entity was processed.
    pub started_at: Option<DateTime<Utc>>,
    /// When the run reached a terminal status.
    pub finished_at: Option<DateTime<Utc>>,
}

impl RuleRun {
    /// Create a pending run for a rule.
    #[must_use]
    pub fn new(rule_id: RuleId, domain: RuleDomain, dry_run: bool) -> Self {
        Self {
            id: RunId::generate(),
            rule_id,
            domain,
            status: RunStatus::Pending,
            progress_percent: 0,
            total: 0,
            completed: 0,
            succeeded: 0,
            failed: 0,
            current_step: None,
            dry_run,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }

    fn transition(&mut self, next: RunStatus) -> Result<(), AdpilotError> {
        if !self.status.can_transition_to(next) {
            return Err(AdpilotError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        if next.is_terminal() {
            self.finished_at = Some(Utc::now());
        }
        Ok(())
    }

    /// Move to `Running` with the number of entities to process.
    pub fn start(&mut self, total: u64) -> Result<(), AdpilotError> {
        self.transition(RunStatus::Running)?;
        self.total = total;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    /// Record the outcome of one entity's action and refresh progress.
    pub fn record_entity(&mut self, success: bool) {
        if success {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self.completed = self.succeeded + self.failed;
        self.progress_percent = if self.total == 0 {
            100
        } else {
            // completed <= total <= u64::MAX / 100 in practice; the u8 cast
            // is bounded by the 0..=100 result.
            #[allow(clippy::cast_possible_truncation)]
            {
                (self.completed * 100 / self.total) as u8
            }
        };
    }

    /// Update the operator-visible step description.
    pub fn set_step(&mut self, step: impl Into<String>) {
        self.current_step = Some(step.into());
    }

    /// Mark the run complete. Progress is forced to 100.
    pub fn complete(&mut self) -> Result<(), AdpilotError> {
        self.transition(RunStatus::Completed)?;
        self.progress_percent = 100;
        Ok(())
    }

    /// Mark the run failed with an operator-visible reason.
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), AdpilotError> {
        self.transition(RunStatus::Failed)?;
        self.current_step = Some(reason.into());
        Ok(())
    }

    /// Mark the run cancelled.
    pub fn cancel(&mut self) -> Result<(), AdpilotError> {
        self.transition(RunStatus::Cancelled)
    }
}
