use std::collections::BTreeSet;

use adpilot_core::{AccountId, AdGroupId, BudgetRule, MetricSnapshot, RuleId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::matcher::rule_matches;

/// A planned budget change for one ad group, won by one rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetChange {
    /// The ad group whose budget changes.
    pub group_id: AdGroupId,
    /// The rule that claimed the group.
    pub rule_id: RuleId,
    /// Budget before the change.
    pub old_budget: f64,
    /// Budget after the change, rounded to two decimals.
    pub new_budget: f64,
}

/// Plan budget changes for the due rules of one account.
///
/// Each element of `due` pairs a rule with the group-aggregated snapshots
/// fetched for that rule's own lookback window. Rules are applied in
/// ascending priority order and each ad group receives at most one change
/// per run: the first applicable rule claims the group and later rules
/// never see it. Groups without a known current budget are skipped.
pub fn plan_budget_changes(
    due: &[(BudgetRule, Vec<MetricSnapshot>)],
    account_id: AccountId,
) -> Vec<BudgetChange> {
    let mut ordered: Vec<&(BudgetRule, Vec<MetricSnapshot>)> = due.iter().collect();
    ordered.sort_by(|a, b| {
        a.0.rule
            .priority
            .cmp(&b.0.rule.priority)
            .then_with(|| a.0.rule.id.as_str().cmp(b.0.rule.id.as_str()))
    });

    let mut claimed: BTreeSet<AdGroupId> = BTreeSet::new();
    let mut changes = Vec::new();

    for (rule, snapshots) in ordered {
        let mut by_group: Vec<&MetricSnapshot> = snapshots.iter().collect();
        by_group.sort_by_key(|s| s.entity_id);

        for snapshot in by_group {
            let group_id = AdGroupId::new(snapshot.entity_id.get());
            if claimed.contains(&group_id) {
                continue;
            }
            let Some(old_budget) = snapshot.budget else {
                continue;
            };
            if rule_matches(&rule.rule, account_id, snapshot) {
                let new_budget = rule.new_budget(old_budget);
                debug!(
                    group = %group_id,
                    rule = %rule.rule.id,
                    old_budget,
                    new_budget,
                    "group claimed for budget change"
                );
                claimed.insert(group_id);
                changes.push(BudgetChange {
                    group_id,
                    rule_id: rule.rule.id.clone(),
                    old_budget,
                    new_budget,
                });
            }
        }
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use adpilot_core::{
        ChangeDirection, CompareOp, Condition, EntityId, Metric, Rule, parse_schedule_time,
    };

    fn account() -> AccountId {
        AccountId::new(1)
    }

    fn group_snapshot(id: u64, budget: f64, goals: u64) -> MetricSnapshot {
        MetricSnapshot {
            budget: Some(budget),
            goals,
            spent: 500.0,
            ..MetricSnapshot::new(EntityId::new(id), account())
        }
    }

    fn shrink_rule(name: &str, priority: u32, percent: u32) -> BudgetRule {
        BudgetRule::new(
            Rule::new(name)
                .with_priority(priority)
                .with_condition(Condition::new(Metric::Goals, CompareOp::Eq, 0.0)),
            percent,
            ChangeDirection::Decrease,
            parse_schedule_time("06:00").unwrap(),
        )
    }

    #[test]
    fn decrease_ten_percent_of_thousand_is_nine_hundred() {
        let due = vec![(shrink_rule("shrink", 1, 10), vec![group_snapshot(5, 1000.0, 0)])];
        let changes = plan_budget_changes(&due, account());
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].new_budget, 900.0);
        assert_eq!(changes[0].old_budget, 1000.0);
    }

    #[test]
    fn at_most_one_change_per_group_per_run() {
        let due = vec![
            (shrink_rule("second", 2, 20), vec![group_snapshot(5, 1000.0, 0)]),
            (shrink_rule("first", 1, 10), vec![group_snapshot(5, 1000.0, 0)]),
        ];
        let changes = plan_budget_changes(&due, account());
        assert_eq!(changes.len(), 1, "group must be claimed exactly once");
        // The priority-1 rule wins the group.
        assert_eq!(changes[0].new_budget, 900.0);
    }

    #[test]
    fn different_groups_can_change_under_different_rules() {
        let due = vec![
            (shrink_rule("a", 1, 10), vec![group_snapshot(5, 1000.0, 0)]),
            (shrink_rule("b", 2, 20), vec![group_snapshot(6, 200.0, 0)]),
        ];
        let changes = plan_budget_changes(&due, account());
        assert_eq!(changes.len(), 2);
        let by_group: Vec<(u64, f64)> = changes
            .iter()
            .map(|c| (c.group_id.get(), c.new_budget))
            .collect();
        assert!(by_group.contains(&(5, 900.0)));
        assert!(by_group.contains(&(6, 160.0)));
    }

    #[test]
    fn change_stays_within_clamped_bounds() {
        let mut rule = shrink_rule("wild", 1, 20);
        rule.change_percent = 99; // bypasses validation on purpose
        let due = vec![(rule, vec![group_snapshot(5, 1000.0, 0)])];
        let changes = plan_budget_changes(&due, account());
        let factor = changes[0].new_budget / changes[0].old_budget;
        assert!((0.80..=1.20).contains(&factor), "clamped to ±20%");
        assert!(
            !(0.99..1.01).contains(&factor),
            "change is at least ±1%"
        );
    }

    #[test]
    fn group_without_budget_is_skipped() {
        let mut snapshot = group_snapshot(5, 0.0, 0);
        snapshot.budget = None;
        let due = vec![(shrink_rule("shrink", 1, 10), vec![snapshot])];
        assert!(plan_budget_changes(&due, account()).is_empty());
    }

    #[test]
    fn non_matching_groups_keep_their_budget() {
        let due = vec![(shrink_rule("shrink", 1, 10), vec![group_snapshot(5, 1000.0, 4)])];
        assert!(plan_budget_changes(&due, account()).is_empty());
    }
}
