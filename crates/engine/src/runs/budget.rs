use std::sync::Arc;

use tracing::{info, instrument, warn};

use adpilot_core::{AccountId, BudgetRule, MetricSnapshot, RuleDomain, RuleId, RuleRun, RunId};
use adpilot_executor::{ActionRequest, PlatformAction};
use adpilot_platform::EntityScope;
use adpilot_rules::plan_budget_changes;

use crate::engine::Engine;
use crate::error::EngineError;
use crate::registry::RuleLock;
use crate::tracker::TaskTracker;

impl Engine {
    /// Run the given budget rules for one account as a single run.
    ///
    /// The scheduler passes every rule whose `schedule_time` fell due at
    /// the tick; a manual trigger passes one id. Rules whose lock is
    /// already held (an earlier run is still going) are skipped, not
    /// queued. Snapshots are fetched per rule over that rule's own
    /// lookback; within the run each ad group receives at most one change,
    /// claimed by the first applicable rule in priority order.
    #[instrument(skip(self, rule_ids), fields(account = %account_id, dry_run))]
    pub async fn run_budget_rules(
        &self,
        account_id: AccountId,
        rule_ids: &[RuleId],
        dry_run: bool,
    ) -> Result<RuleRun, EngineError> {
        let run_rule_id = Self::budget_run_id(account_id);
        let run_id = RunId::generate();

        // The combined run itself is serialized per account, and each
        // participating rule is locked individually so a manual trigger
        // cannot race a scheduled one.
        let run_guard = self.registry.begin(&run_rule_id, &run_id)?;

        let all_rules = self.rules.budget_rules(account_id).await?;
        let mut rules: Vec<BudgetRule> = Vec::new();
        let mut rule_guards: Vec<RuleLock> = Vec::new();
        for id in rule_ids {
            let Some(rule) = all_rules.iter().find(|r| &r.rule.id == id) else {
                return Err(EngineError::RuleNotFound(id.clone()));
            };
            if !rule.rule.enabled {
                continue;
            }
            match self.registry.lock_rule(id) {
                Ok(guard) => {
                    rule_guards.push(guard);
                    rules.push(rule.clone());
                }
                Err(EngineError::RunInProgress(id)) => {
                    warn!(rule = %id, "budget rule already running, skipped for this run");
                }
                Err(err) => return Err(err),
            }
        }

        let mut tracker = TaskTracker::create(
            run_id,
            run_rule_id,
            RuleDomain::Budget,
            dry_run,
            Arc::clone(&self.tasks),
            run_guard.token(),
        )
        .await?;

        tracker.set_step("fetching group snapshots").await?;
        let mut due: Vec<(BudgetRule, Vec<MetricSnapshot>)> = Vec::new();
        for rule in rules {
            match self
                .metrics
                .fetch(account_id, EntityScope::AdGroup, rule.lookback_days)
                .await
            {
                Ok(snapshots) => due.push((rule, snapshots)),
                Err(err) => {
                    tracker.fail(format!("metrics fetch failed: {err}")).await?;
                    return Ok(tracker.run().clone());
                }
            }
        }

        let changes = plan_budget_changes(&due, account_id);
        tracker.start(changes.len() as u64).await?;
        info!(account = %account_id, planned = changes.len(), "budget run planned");

        for change in changes {
            if tracker.is_cancelled() {
                tracker.cancel().await?;
                return Ok(tracker.run().clone());
            }
            let request = ActionRequest {
                run_id: tracker.run_id().clone(),
                rule_id: change.rule_id.clone(),
                account_id,
                dry_run,
                action: PlatformAction::SetBudget {
                    group_id: change.group_id,
                    old_budget: change.old_budget,
                    new_budget: change.new_budget,
                },
            };
            match self.executor.perform(&request).await {
                Ok(outcome) => tracker.record_entity(outcome.is_success()).await?,
                Err(err) => {
                    tracker.fail(err.to_string()).await?;
                    return Ok(tracker.run().clone());
                }
            }
        }

        tracker.complete().await?;
        Ok(tracker.run().clone())
    }
}
