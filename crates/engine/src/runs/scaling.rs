use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{info, instrument};

use adpilot_core::{AccountId, AdGroupId, MetricSnapshot, RuleDomain, RuleId, RuleRun, RunId};
use adpilot_executor::{ActionRequest, PlatformAction};
use adpilot_platform::EntityScope;
use adpilot_rules::{DuplicationPlan, plan_duplication, plan_manual_duplication};

use crate::engine::Engine;
use crate::error::EngineError;
use crate::tracker::TaskTracker;

impl Engine {
    /// Run one scaling config over an account's ad groups.
    ///
    /// Every banner of every group is classified independently against the
    /// config's conditions; groups with at least one positive banner are
    /// duplicated `duplicates_count` times with the config's overrides.
    #[instrument(skip(self), fields(config = %config_id, account = %account_id, dry_run))]
    pub async fn run_scaling_config(
        &self,
        config_id: &RuleId,
        account_id: AccountId,
        dry_run: bool,
    ) -> Result<RuleRun, EngineError> {
        let config = self
            .rules
            .scaling_config(config_id)
            .await?
            .ok_or_else(|| EngineError::RuleNotFound(config_id.clone()))?;

        let run_id = RunId::generate();
        let guard = self.registry.begin(config_id, &run_id)?;
        let mut tracker = TaskTracker::create(
            run_id,
            config_id.clone(),
            RuleDomain::Scaling,
            dry_run,
            Arc::clone(&self.tasks),
            guard.token(),
        )
        .await?;

        tracker.set_step("fetching banner snapshots").await?;
        let snapshots = match self
            .metrics
            .fetch(account_id, EntityScope::Banner, self.config.scaling_lookback_days)
            .await
        {
            Ok(snapshots) => snapshots,
            Err(err) => {
                tracker.fail(format!("metrics fetch failed: {err}")).await?;
                return Ok(tracker.run().clone());
            }
        };

        let plans: Vec<DuplicationPlan> = group_snapshots(snapshots)
            .into_iter()
            .filter_map(|(group_id, banners)| {
                plan_duplication(&config, account_id, group_id, &banners)
            })
            .collect();

        info!(account = %account_id, eligible_groups = plans.len(), "scaling run planned");
        self.execute_duplications(&mut tracker, account_id, config_id, plans, dry_run)
            .await?;
        Ok(tracker.run().clone())
    }

    /// Duplicate an explicit list of ad groups, bypassing condition
    /// evaluation entirely. Used by the operator's manual "duplicate now".
    #[instrument(skip(self, group_ids), fields(config = %config_id, account = %account_id, dry_run))]
    pub async fn duplicate_groups_manually(
        &self,
        config_id: &RuleId,
        account_id: AccountId,
        group_ids: &[AdGroupId],
        dry_run: bool,
    ) -> Result<RuleRun, EngineError> {
        let config = self
            .rules
            .scaling_config(config_id)
            .await?
            .ok_or_else(|| EngineError::RuleNotFound(config_id.clone()))?;

        let run_id = RunId::generate();
        let guard = self.registry.begin(config_id, &run_id)?;
        let mut tracker = TaskTracker::create(
            run_id,
            config_id.clone(),
            RuleDomain::Scaling,
            dry_run,
            Arc::clone(&self.tasks),
            guard.token(),
        )
        .await?;

        let mut sorted = group_ids.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        let plans: Vec<DuplicationPlan> = sorted
            .into_iter()
            .map(|group_id| plan_manual_duplication(&config, group_id))
            .collect();

        info!(groups = plans.len(), "manual duplication requested");
        self.execute_duplications(&mut tracker, account_id, config_id, plans, dry_run)
            .await?;
        Ok(tracker.run().clone())
    }

    async fn execute_duplications(
        &self,
        tracker: &mut TaskTracker,
        account_id: AccountId,
        config_id: &RuleId,
        plans: Vec<DuplicationPlan>,
        dry_run: bool,
    ) -> Result<(), EngineError> {
        tracker.start(plans.len() as u64).await?;

        for plan in plans {
            if tracker.is_cancelled() {
                tracker.cancel().await?;
                return Ok(());
            }
            let request = ActionRequest {
                run_id: tracker.run_id().clone(),
                rule_id: config_id.clone(),
                account_id,
                dry_run,
                action: PlatformAction::DuplicateGroup {
                    group_id: plan.group_id,
                    copies: plan.copies,
                    overrides: plan.overrides,
                },
            };
            match self.executor.perform(&request).await {
                Ok(outcome) => tracker.record_entity(outcome.is_success()).await?,
                Err(err) => {
                    tracker.fail(err.to_string()).await?;
                    return Ok(());
                }
            }
        }

        tracker.complete().await?;
        Ok(())
    }
}

/// Group banner snapshots by their parent ad group, ascending group id.
/// Snapshots without a known group are skipped.
fn group_snapshots(snapshots: Vec<MetricSnapshot>) -> BTreeMap<AdGroupId, Vec<MetricSnapshot>> {
    let mut groups: BTreeMap<AdGroupId, Vec<MetricSnapshot>> = BTreeMap::new();
    for snapshot in snapshots {
        if let Some(group_id) = snapshot.group_id {
            groups.entry(group_id).or_default().push(snapshot);
        }
    }
    groups
}
