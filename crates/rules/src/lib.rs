pub mod matcher;
pub mod plan;
pub mod priority;

pub use matcher::{evaluate, rule_matches};
pub use plan::{
    BudgetChange, Classification, DisableAction, DuplicationPlan, plan_budget_changes,
    plan_disables, plan_duplication, plan_manual_duplication,
};
pub use priority::{HasRule, first_match, sort_for_evaluation};
