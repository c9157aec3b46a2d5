use adpilot_core::{AccountId, Condition, MetricSnapshot, Rule};

/// Evaluate one condition against a snapshot.
///
/// When the metric extracts to `None` (a zero denominator, or ROI without
/// attributed revenue) the condition is `false`: absence of data means the
/// entity does not qualify. Evaluation never fails.
#[must_use]
pub fn evaluate(condition: &Condition, snapshot: &MetricSnapshot) -> bool {
    match condition.metric.extract(snapshot) {
        Some(value) => condition.op.compare(value, condition.threshold),
        None => false,
    }
}

/// Whether a rule matches an entity's snapshot for the given account.
///
/// Returns `false` for disabled rules, for rules scoped to other accounts,
/// and for rules with an empty condition list (a guard against
/// configuration mistakes -- zero conditions is never "always true").
/// Otherwise the conditions combine with AND.
#[must_use]
pub fn rule_matches(rule: &Rule, account_id: AccountId, snapshot: &MetricSnapshot) -> bool {
    if !rule.enabled || !rule.applies_to(account_id) {
        return false;
    }
    if rule.conditions.is_empty() {
        return false;
    }
    rule.conditions.iter().all(|c| evaluate(c, snapshot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use adpilot_core::{CompareOp, EntityId, Metric};

    fn account() -> AccountId {
        AccountId::new(1)
    }

    fn snapshot(spent: f64, goals: u64) -> MetricSnapshot {
        MetricSnapshot {
            spent,
            goals,
            ..MetricSnapshot::new(EntityId::new(10), account())
        }
    }

    fn waster_rule() -> Rule {
        Rule::new("stop-wasters")
            .with_condition(Condition::new(Metric::Spent, CompareOp::Ge, 100.0))
            .with_condition(Condition::new(Metric::Goals, CompareOp::Eq, 0.0))
    }

    #[test]
    fn null_metric_evaluates_false() {
        let condition = Condition::new(Metric::Roi, CompareOp::Lt, 0.0);
        let snap = snapshot(100.0, 0);
        assert!(!evaluate(&condition, &snap), "missing ROI must not match");
    }

    #[test]
    fn null_metric_false_for_every_operator() {
        let snap = snapshot(100.0, 0);
        for op in CompareOp::ALL {
            let condition = Condition::new(Metric::CostPerGoal, op, 0.0);
            assert!(!evaluate(&condition, &snap), "op {op:?} on null metric");
        }
    }

    #[test]
    fn conditions_and_together() {
        let rule = waster_rule();
        assert!(rule_matches(&rule, account(), &snapshot(150.0, 0)));
        assert!(!rule_matches(&rule, account(), &snapshot(150.0, 2)));
        assert!(!rule_matches(&rule, account(), &snapshot(50.0, 0)));
    }

    #[test]
    fn disabled_rule_never_matches() {
        let rule = waster_rule().with_enabled(false);
        assert!(!rule_matches(&rule, account(), &snapshot(150.0, 0)));
    }

    #[test]
    fn empty_condition_list_never_matches() {
        let rule = Rule::new("misconfigured");
        assert!(!rule_matches(&rule, account(), &snapshot(150.0, 0)));
    }

    #[test]
    fn account_scoping() {
        let rule = waster_rule().with_account(AccountId::new(2));
        assert!(!rule_matches(&rule, account(), &snapshot(150.0, 0)));
        assert!(rule_matches(&rule, AccountId::new(2), &snapshot(150.0, 0)));
    }

    #[test]
    fn equality_is_exact() {
        let rule = Rule::new("exact").with_condition(Condition::new(Metric::Spent, CompareOp::Eq, 99.99));
        assert!(rule_matches(&rule, account(), &snapshot(99.99, 0)));
        assert!(!rule_matches(&rule, account(), &snapshot(99.98, 0)));
    }
}
