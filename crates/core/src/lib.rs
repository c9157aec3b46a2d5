pub mod condition;
pub mod error;
pub mod metric;
pub mod rule;
pub mod run;
pub mod snapshot;
pub mod types;

pub use condition::Condition;
pub use error::{AdpilotError, ValidationError};
pub use metric::{CompareOp, Metric};
pub use rule::{
    BUDGET_PERCENT_RANGE, BudgetRule, ChangeDirection, DUPLICATES_RANGE, DisableRule,
    DuplicateOverrides, Rule, ScalingConfig, SubField, parse_schedule_time,
};
pub use run::{RuleDomain, RuleRun, RunStatus};
pub use snapshot::{MetricSnapshot, round2};
pub use types::{AccountId, AdGroupId, BannerId, CampaignId, EntityId, RuleId, RunId};
