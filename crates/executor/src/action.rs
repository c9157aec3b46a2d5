use adpilot_audit::ChangeLogEntry;
use adpilot_core::{AccountId, AdGroupId, BannerId, DuplicateOverrides, EntityId, RuleId, RunId};

/// One mutating platform action, as planned by the rules crate.
#[derive(Debug, Clone)]
pub enum PlatformAction {
    /// Disable a banner.
    Disable {
        /// The banner to disable.
        banner_id: BannerId,
        /// The banner was already off at snapshot time; the executor
        /// records a successful no-op without calling the platform.
        already_disabled: bool,
    },
    /// Change an ad group's budget.
    SetBudget {
        /// The ad group.
        group_id: AdGroupId,
        /// Budget before the change.
        old_budget: f64,
        /// Budget to write.
        new_budget: f64,
    },
    /// Duplicate an ad group.
    DuplicateGroup {
        /// The source ad group.
        group_id: AdGroupId,
        /// How many copies to create.
        copies: u32,
        /// Overrides applied uniformly to every copy.
        overrides: DuplicateOverrides,
    },
}

impl PlatformAction {
    /// The entity this action targets, for logging and audit.
    #[must_use]
    pub fn entity_id(&self) -> EntityId {
        match self {
            Self::Disable { banner_id, .. } => EntityId::from(*banner_id),
            Self::SetBudget { group_id, .. } | Self::DuplicateGroup { group_id, .. } => {
                EntityId::from(*group_id)
            }
        }
    }
}

/// An action together with its run context.
#[derive(Debug, Clone)]
pub struct ActionRequest {
    /// The run performing the action.
    pub run_id: RunId,
    /// The rule that planned the action.
    pub rule_id: RuleId,
    /// The account being processed.
    pub account_id: AccountId,
    /// Suppress the mutating call and log the would-be change.
    pub dry_run: bool,
    /// The action itself.
    pub action: PlatformAction,
}

/// Outcome of performing one action.
///
/// Both `Executed` and `Failed` carry the change-log entry that was
/// appended; `SkippedWhitelisted` produces no entry because no action was
/// attempted.
#[derive(Debug)]
pub enum ExecutionOutcome {
    /// The action succeeded (including dry runs and idempotent no-ops).
    Executed(ChangeLogEntry),
    /// The action failed after retries; the run continues.
    Failed(ChangeLogEntry),
    /// The whitelist re-check caught a banner protected since planning.
    SkippedWhitelisted,
}

impl ExecutionOutcome {
    /// Whether the run should count this entity as succeeded.
    ///
    /// A whitelisted skip counts as success: the entity was processed and
    /// deliberately left untouched.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Executed(_) | Self::SkippedWhitelisted)
    }
}
