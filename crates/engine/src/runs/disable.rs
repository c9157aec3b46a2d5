use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{info, instrument};

use adpilot_core::{AccountId, BannerId, Metric, RuleDomain, RuleRun, RunId};
use adpilot_executor::{ActionRequest, PlatformAction};
use adpilot_platform::EntityScope;
use adpilot_rules::{plan_disables, sort_for_evaluation};

use crate::engine::Engine;
use crate::enrich::RevenueIndex;
use crate::error::EngineError;
use crate::tracker::TaskTracker;

impl Engine {
    /// Run the shared disable analysis for one account.
    ///
    /// Loads the account's disable rules, fetches banner snapshots over the
    /// engine's disable lookback, filters out whitelisted banners, resolves
    /// the winning rule per banner (first match in ascending priority
    /// order), and disables the claimed banners. The returned [`RuleRun`]
    /// carries the final task snapshot; a fatal platform error surfaces as
    /// run status `Failed`.
    #[instrument(skip(self), fields(account = %account_id, dry_run))]
    pub async fn run_disable_analysis(
        &self,
        account_id: AccountId,
        dry_run: bool,
    ) -> Result<RuleRun, EngineError> {
        let analysis_id = Self::disable_analysis_id(account_id);
        let run_id = RunId::generate();
        let guard = self.registry.begin(&analysis_id, &run_id)?;

        let mut rules = self.rules.disable_rules(account_id).await?;
        rules.retain(|r| r.rule.enabled);
        sort_for_evaluation(&mut rules);

        let mut tracker = TaskTracker::create(
            run_id,
            analysis_id,
            RuleDomain::Disable,
            dry_run,
            Arc::clone(&self.tasks),
            guard.token(),
        )
        .await?;

        tracker.set_step("fetching snapshots").await?;
        let mut snapshots = match self
            .metrics
            .fetch(account_id, EntityScope::Banner, self.config.disable_lookback_days)
            .await
        {
            Ok(snapshots) => snapshots,
            Err(err) => {
                tracker.fail(format!("metrics fetch failed: {err}")).await?;
                return Ok(tracker.run().clone());
            }
        };

        // Whitelisted banners are excluded before any rule is tried.
        let protected: BTreeSet<BannerId> = self.whitelist.list().await?.into_iter().collect();
        snapshots.retain(|s| !protected.contains(&BannerId::new(s.entity_id.get())));

        // Revenue is only fetched when some rule actually reads ROI.
        let revenue = if rules.iter().any(|r| r.rule.references(Metric::Roi)) {
            tracker.set_step("fetching attribution revenue").await?;
            RevenueIndex::fetch(
                self.attribution.as_ref(),
                account_id,
                self.config.disable_lookback_days,
            )
            .await
        } else {
            RevenueIndex::default()
        };

        let actions = plan_disables(&rules, account_id, &snapshots, |snapshot, sub_field| {
            revenue.revenue_for(snapshot, sub_field)
        });

        tracker.start(actions.len() as u64).await?;
        info!(account = %account_id, planned = actions.len(), "disable analysis planned");

        for action in actions {
            if tracker.is_cancelled() {
                tracker.cancel().await?;
                return Ok(tracker.run().clone());
            }
            let request = ActionRequest {
                run_id: tracker.run_id().clone(),
                rule_id: action.rule_id.clone(),
                account_id,
                dry_run,
                action: PlatformAction::Disable {
                    banner_id: action.banner_id,
                    already_disabled: action.already_disabled,
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
