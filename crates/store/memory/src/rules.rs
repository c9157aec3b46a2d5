use async_trait::async_trait;
use dashmap::DashMap;

use adpilot_core::{AccountId, BudgetRule, DisableRule, RuleId, ScalingConfig};
use adpilot_store::{RuleStore, StoreError};

/// In-memory [`RuleStore`] backed by one [`DashMap`] per domain.
///
/// Rules are validated on upsert, so reads never surface invalid
/// definitions. Intended for tests and local development.
#[derive(Debug, Default)]
pub struct MemoryRuleStore {
    disable: DashMap<RuleId, DisableRule>,
    budget: DashMap<RuleId, BudgetRule>,
    scaling: DashMap<RuleId, ScalingConfig>,
}

impl MemoryRuleStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RuleStore for MemoryRuleStore {
    async fn disable_rules(&self, account_id: AccountId) -> Result<Vec<DisableRule>, StoreError> {
        Ok(self
            .disable
            .iter()
            .filter(|entry| entry.value().rule.applies_to(account_id))
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn budget_rules(&self, account_id: AccountId) -> Result<Vec<BudgetRule>, StoreError> {
        Ok(self
            .budget
            .iter()
            .filter(|entry| entry.value().rule.applies_to(account_id))
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn scaling_configs(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<ScalingConfig>, StoreError> {
        Ok(self
            .scaling
            .iter()
            .filter(|entry| entry.value().rule.applies_to(account_id))
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn scaling_config(&self, id: &RuleId) -> Result<Option<ScalingConfig>, StoreError> {
        Ok(self.scaling.get(id).map(|entry| entry.value().clone()))
    }

    async fn upsert_disable_rule(&self, rule: DisableRule) -> Result<(), StoreError> {
        rule.validate()?;
        self.disable.insert(rule.rule.id.clone(), rule);
        Ok(())
    }

    async fn upsert_budget_rule(&self, rule: BudgetRule) -> Result<(), StoreError> {
        rule.validate()?;
        self.budget.insert(rule.rule.id.clone(), rule);
        Ok(())
    }

    async fn upsert_scaling_config(&self, config: ScalingConfig) -> Result<(), StoreError> {
        config.validate()?;
        self.scaling.insert(config.rule.id.clone(), config);
        Ok(())
    }

    async fn delete_rule(&self, id: &RuleId) -> Result<bool, StoreError> {
        let removed = self.disable.remove(id).is_some()
            || self.budget.remove(id).is_some()
            || self.scaling.remove(id).is_some();
        Ok(removed)
    }
}
