use async_trait::async_trait;

use adpilot_core::{AccountId, BudgetRule, DisableRule, RuleId, ScalingConfig};

use crate::error::StoreError;

/// Persistence for rule definitions, per domain.
///
/// Implementations must validate rules before persisting (the engine never
/// sees an invalid rule) and must provide consistent reads: a run loads its
/// rule set once and works against that view.
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Disable rules applicable to an account (scoped or global), in no
    /// particular order.
    async fn disable_rules(&self, account_id: AccountId) -> Result<Vec<DisableRule>, StoreError>;

    /// Budget rules applicable to an account.
    async fn budget_rules(&self, account_id: AccountId) -> Result<Vec<BudgetRule>, StoreError>;

    /// Scaling configs applicable to an account.
    async fn scaling_configs(&self, account_id: AccountId)
    -> Result<Vec<ScalingConfig>, StoreError>;

    /// Fetch one scaling config by id.
    async fn scaling_config(&self, id: &RuleId) -> Result<Option<ScalingConfig>, StoreError>;

    /// Create or update a disable rule. Fails with
    /// [`StoreError::Validation`] for invalid definitions.
    async fn upsert_disable_rule(&self, rule: DisableRule) -> Result<(), StoreError>;

    /// Create or update a budget rule.
    async fn upsert_budget_rule(&self, rule: BudgetRule) -> Result<(), StoreError>;

    /// Create or update a scaling config.
    async fn upsert_scaling_config(&self, config: ScalingConfig) -> Result<(), StoreError>;

    /// Delete a rule of any domain. Returns `true` if a rule was removed.
    async fn delete_rule(&self, id: &RuleId) -> Result<bool, StoreError>;
}
