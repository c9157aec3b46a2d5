use adpilot_core::{AccountId, BudgetRule, DisableRule, MetricSnapshot, Rule, ScalingConfig};

use crate::matcher::rule_matches;

/// Access to the shared rule fields of a domain rule type.
pub trait HasRule {
    /// The shared rule fields.
    fn rule(&self) -> &Rule;
}

impl HasRule for Rule {
    fn rule(&self) -> &Rule {
        self
    }
}

impl<T: HasRule> HasRule for &T {
    fn rule(&self) -> &Rule {
        (**self).rule()
    }
}

impl HasRule for DisableRule {
    fn rule(&self) -> &Rule {
        &self.rule
    }
}

impl HasRule for BudgetRule {
    fn rule(&self) -> &Rule {
        &self.rule
    }
}

impl HasRule for ScalingConfig {
    fn rule(&self) -> &Rule {
        &self.rule
    }
}

/// Sort rules into evaluation order: ascending priority, ties broken by
/// rule id so that ordering is deterministic across runs.
pub fn sort_for_evaluation<T: HasRule>(rules: &mut [T]) {
    rules.sort_by(|a, b| {
        let (a, b) = (a.rule(), b.rule());
        a.priority
            .cmp(&b.priority)
            .then_with(|| a.id.as_str().cmp(b.id.as_str()))
    });
}

/// Resolve the winning rule for one entity: the first rule in evaluation
/// order whose conditions all hold. Lower-priority rules are never
/// consulted once a winner is found.
///
/// `rules` must already be in evaluation order (see [`sort_for_evaluation`]).
#[must_use]
pub fn first_match<'a, T: HasRule>(
    rules: &'a [T],
    account_id: AccountId,
    snapshot: &MetricSnapshot,
) -> Option<&'a T> {
    rules
        .iter()
        .find(|candidate| rule_matches(candidate.rule(), account_id, snapshot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use adpilot_core::{CompareOp, Condition, EntityId, Metric};

    fn rule(name: &str, priority: u32, threshold: f64) -> Rule {
        Rule::new(name)
            .with_priority(priority)
            .with_condition(Condition::new(Metric::Spent, CompareOp::Ge, threshold))
    }

    fn snapshot(spent: f64) -> MetricSnapshot {
        MetricSnapshot {
            spent,
            ..MetricSnapshot::new(EntityId::new(1), AccountId::new(1))
        }
    }

    #[test]
    fn sorts_by_priority_then_id() {
        let mut rules = vec![rule("c", 2, 0.0), rule("a", 1, 0.0), rule("b", 1, 0.0)];
        sort_for_evaluation(&mut rules);
        assert_eq!(rules[0].priority, 1);
        assert_eq!(rules[1].priority, 1);
        assert_eq!(rules[2].priority, 2);
        assert!(rules[0].id.as_str() <= rules[1].id.as_str(), "deterministic tiebreak");
    }

    #[test]
    fn first_match_wins_over_later_rules() {
        let mut rules = vec![rule("loose", 2, 10.0), rule("strict", 1, 100.0)];
        sort_for_evaluation(&mut rules);

        // Both rules match; only the priority-1 rule may win.
        let winner = first_match(&rules, AccountId::new(1), &snapshot(150.0)).unwrap();
        assert_eq!(winner.name, "strict");

        // Only the looser rule matches.
        let winner = first_match(&rules, AccountId::new(1), &snapshot(50.0)).unwrap();
        assert_eq!(winner.name, "loose");
    }

    #[test]
    fn no_rule_matches_leaves_entity_untouched() {
        let mut rules = vec![rule("strict", 1, 100.0)];
        sort_for_evaluation(&mut rules);
        assert!(first_match(&rules, AccountId::new(1), &snapshot(10.0)).is_none());
    }

    #[test]
    fn disabled_rules_are_skipped_in_order() {
        let mut rules = vec![rule("first", 1, 0.0).with_enabled(false), rule("second", 2, 0.0)];
        sort_for_evaluation(&mut rules);
        let winner = first_match(&rules, AccountId::new(1), &snapshot(50.0)).unwrap();
        assert_eq!(winner.name, "second");
    }
}
