use serde::{Deserialize, Serialize};
use std::fmt;

use crate::metric::{CompareOp, Metric};

/// A single threshold check against one metric.
///
/// Conditions inside a rule combine with implicit AND. The metric and
/// operator are closed enums, so a persisted condition with an unknown id
/// fails deserialization instead of surfacing at evaluation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// The metric to read from the snapshot.
    pub metric: Metric,
    /// The comparison to apply.
    pub op: CompareOp,
    /// The threshold on the right-hand side.
    pub threshold: f64,
}

impl Condition {
    /// Create a condition.
    #[must_use]
    pub fn new(metric: Metric, op: CompareOp, threshold: f64) -> Self {
        Self {
            metric,
            op,
            threshold,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.metric, self.op.symbol(), self.threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn condition_display() {
        let c = Condition::new(Metric::Spent, CompareOp::Ge, 100.0);
        assert_eq!(c.to_string(), "spent ≥ 100");
    }

    #[test]
    fn condition_serde_roundtrip() {
        let c = Condition::new(Metric::Goals, CompareOp::Eq, 0.0);
        let json = serde_json::to_string(&c).unwrap();
        let back: Condition = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn condition_with_unknown_metric_fails_to_load() {
        let json = r#"{"metric": "viewability", "op": "gt", "threshold": 1.0}"#;
        assert!(serde_json::from_str::<Condition>(json).is_err());
    }
}
