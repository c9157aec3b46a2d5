use adpilot_core::{AccountId, BannerId, DisableRule, Metric, MetricSnapshot, RuleId, SubField};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::matcher::rule_matches;
use crate::priority::sort_for_evaluation;

/// A planned disable of one banner, won by one rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisableAction {
    /// The banner to disable.
    pub banner_id: BannerId,
    /// The rule that claimed the banner.
    pub rule_id: RuleId,
    /// The banner was already disabled when the snapshot was taken; the
    /// executor records a successful no-op instead of calling the platform.
    pub already_disabled: bool,
}

/// Plan disable actions for one account.
///
/// `snapshots` must already exclude whitelisted banners -- the whitelist is
/// consulted before any rule is tried. Rules are evaluated in ascending
/// priority order and the first match claims the banner; snapshots are
/// visited in ascending entity id order so truncated runs are reproducible.
///
/// `revenue_for` supplies attributed revenue for a snapshot under a rule's
/// sub-field selection; it is only consulted for rules that reference the
/// ROI metric.
pub fn plan_disables(
    rules: &[DisableRule],
    account_id: AccountId,
    snapshots: &[MetricSnapshot],
    revenue_for: impl Fn(&MetricSnapshot, Option<SubField>) -> Option<f64>,
) -> Vec<DisableAction> {
    let mut ordered: Vec<&DisableRule> = rules.iter().collect();
    sort_for_evaluation(&mut ordered);

    let mut by_entity: Vec<&MetricSnapshot> = snapshots.iter().collect();
    by_entity.sort_by_key(|s| s.entity_id);

    let mut actions = Vec::new();
    for snapshot in by_entity {
        let winner = resolve_winner(&ordered, account_id, snapshot, &revenue_for);
        if let Some(rule) = winner {
            debug!(
                banner = %snapshot.entity_id,
                rule = %rule.rule.id,
                "banner claimed for disable"
            );
            actions.push(DisableAction {
                banner_id: BannerId::new(snapshot.entity_id.get()),
                rule_id: rule.rule.id.clone(),
                already_disabled: !snapshot.enabled,
            });
        }
    }
    actions
}

/// Try rules in evaluation order against one banner, enriching the snapshot
/// with the rule's sub-field revenue when the rule reads ROI.
fn resolve_winner<'a>(
    ordered: &[&'a DisableRule],
    account_id: AccountId,
    snapshot: &MetricSnapshot,
    revenue_for: &impl Fn(&MetricSnapshot, Option<SubField>) -> Option<f64>,
) -> Option<&'a DisableRule> {
    for &rule in ordered {
        if rule.rule.references(Metric::Roi) {
            let mut enriched = snapshot.clone();
            enriched.lt_revenue = revenue_for(snapshot, rule.roi_sub_field);
            if rule_matches(&rule.rule, account_id, &enriched) {
                return Some(rule);
            }
        } else if rule_matches(&rule.rule, account_id, snapshot) {
            return Some(rule);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use adpilot_core::{CompareOp, Condition, EntityId, Rule};

    fn account() -> AccountId {
        AccountId::new(1)
    }

    fn banner_snapshot(id: u64, spent: f64, goals: u64) -> MetricSnapshot {
        MetricSnapshot {
            spent,
            goals,
            ..MetricSnapshot::new(EntityId::new(id), account())
        }
    }

    fn waster(priority: u32) -> DisableRule {
        DisableRule::new(
            Rule::new(format!("waster-p{priority}"))
                .with_priority(priority)
                .with_condition(Condition::new(Metric::Spent, CompareOp::Ge, 100.0))
                .with_condition(Condition::new(Metric::Goals, CompareOp::Eq, 0.0)),
        )
    }

    fn no_revenue(_: &MetricSnapshot, _: Option<SubField>) -> Option<f64> {
        None
    }

    #[test]
    fn matching_banner_is_disabled() {
        let rules = vec![waster(1)];
        let snapshots = vec![banner_snapshot(10, 150.0, 0)];
        let actions = plan_disables(&rules, account(), &snapshots, no_revenue);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].banner_id, BannerId::new(10));
        assert!(!actions[0].already_disabled);
    }

    #[test]
    fn at_most_one_rule_fires_per_banner() {
        // Both rules match the snapshot; only priority 1 may claim it.
        let rules = vec![waster(2), waster(1)];
        let snapshots = vec![banner_snapshot(10, 150.0, 0)];
        let actions = plan_disables(&rules, account(), &snapshots, no_revenue);
        assert_eq!(actions.len(), 1);
        let winner = rules.iter().find(|r| r.rule.id == actions[0].rule_id).unwrap();
        assert_eq!(winner.rule.priority, 1);
    }

    #[test]
    fn unmatched_banners_are_untouched() {
        let rules = vec![waster(1)];
        let snapshots = vec![banner_snapshot(10, 10.0, 0), banner_snapshot(11, 500.0, 3)];
        let actions = plan_disables(&rules, account(), &snapshots, no_revenue);
        assert!(actions.is_empty());
    }

    #[test]
    fn actions_come_out_in_ascending_banner_order() {
        let rules = vec![waster(1)];
        let snapshots = vec![
            banner_snapshot(30, 150.0, 0),
            banner_snapshot(10, 150.0, 0),
            banner_snapshot(20, 150.0, 0),
        ];
        let actions = plan_disables(&rules, account(), &snapshots, no_revenue);
        let ids: Vec<u64> = actions.iter().map(|a| a.banner_id.get()).collect();
        assert_eq!(ids, vec![10, 20, 30]);
    }

    #[test]
    fn already_disabled_banner_becomes_a_noop() {
        let rules = vec![waster(1)];
        let mut snap = banner_snapshot(10, 150.0, 0);
        snap.enabled = false;
        let actions = plan_disables(&rules, account(), &[snap], no_revenue);
        assert!(actions[0].already_disabled);
    }

    #[test]
    fn roi_rule_without_revenue_does_not_fire() {
        let rule = DisableRule::new(
            Rule::new("negative-roi")
                .with_condition(Condition::new(Metric::Roi, CompareOp::Lt, 0.0)),
        );
        let snapshots = vec![banner_snapshot(10, 150.0, 0)];
        let actions = plan_disables(&[rule], account(), &snapshots, no_revenue);
        assert!(actions.is_empty(), "null ROI must evaluate false");
    }

    #[test]
    fn roi_rule_uses_enriched_revenue() {
        let rule = DisableRule::new(
            Rule::new("negative-roi")
                .with_condition(Condition::new(Metric::Roi, CompareOp::Lt, 0.0)),
        );
        let snapshots = vec![banner_snapshot(10, 150.0, 0)];
        // Revenue 100 on spend 150 -> ROI is negative.
        let actions = plan_disables(&[rule], account(), &snapshots, |_, _| Some(100.0));
        assert_eq!(actions.len(), 1);
    }
}
