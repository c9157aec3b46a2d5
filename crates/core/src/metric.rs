use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::snapshot::MetricSnapshot;

/// The closed set of metrics a rule condition can reference.
///
/// Persisted rules store metric ids as strings; deserialization resolves
/// them against this enum, so an unknown id fails at rule load time rather
/// than at evaluation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Money spent over the analysis window.
    Spent,
    /// Click count.
    Clicks,
    /// Impression count.
    Shows,
    /// Click-through rate, percent.
    Ctr,
    /// Cost per click.
    Cpc,
    /// Conversion rate (goals per click), percent.
    Cr,
    /// Cost per conversion goal.
    CostPerGoal,
    /// Conversion goal count.
    Goals,
    /// Return on investment, percent. Requires attribution enrichment.
    Roi,
}

impl Metric {
    /// Every supported metric, in catalog order.
    pub const ALL: [Self; 9] = [
        Self::Spent,
        Self::Clicks,
        Self::Shows,
        Self::Ctr,
        Self::Cpc,
        Self::Cr,
        Self::CostPerGoal,
        Self::Goals,
        Self::Roi,
    ];

    /// Stable string id, as persisted in rule definitions.
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::Spent => "spent",
            Self::Clicks => "clicks",
            Self::Shows => "shows",
            Self::Ctr => "ctr",
            Self::Cpc => "cpc",
            Self::Cr => "cr",
            Self::CostPerGoal => "cost_per_goal",
            Self::Goals => "goals",
            Self::Roi => "roi",
        }
    }

    /// Human-readable label for configuration UIs.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Spent => "Spent",
            Self::Clicks => "Clicks",
            Self::Shows => "Impressions",
            Self::Ctr => "CTR",
            Self::Cpc => "CPC",
            Self::Cr => "CR",
            Self::CostPerGoal => "Cost per goal",
            Self::Goals => "Goals",
            Self::Roi => "ROI",
        }
    }

    /// One-line description of what the metric measures.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Spent => "Total spend over the analysis window",
            Self::Clicks => "Number of clicks",
            Self::Shows => "Number of impressions",
            Self::Ctr => "Clicks per impression, in percent",
            Self::Cpc => "Average cost of one click",
            Self::Cr => "Goals per click, in percent",
            Self::CostPerGoal => "Average cost of one conversion goal",
            Self::Goals => "Number of conversion goals reached",
            Self::Roi => "Attributed profit relative to spend, in percent",
        }
    }

    /// Extract this metric's value from a snapshot.
    ///
    /// Returns `None` when the value is undefined for the snapshot: a zero
    /// denominator for derived metrics, or missing attributed revenue for
    /// [`Metric::Roi`].
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn extract(self, snapshot: &MetricSnapshot) -> Option<f64> {
        match self {
            Self::Spent => Some(snapshot.spent),
            Self::Clicks => Some(snapshot.clicks as f64),
            Self::Shows => Some(snapshot.shows as f64),
            Self::Ctr => snapshot.ctr(),
            Self::Cpc => snapshot.cpc(),
            Self::Cr => snapshot.cr(),
            Self::CostPerGoal => snapshot.cost_per_goal(),
            Self::Goals => Some(snapshot.goals as f64),
            Self::Roi => snapshot.roi_percent(),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Metric {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.id() == s)
            .ok_or_else(|| ValidationError::UnknownMetric(s.to_owned()))
    }
}

/// Numeric comparison operators available to conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
}

impl CompareOp {
    /// Every supported operator.
    pub const ALL: [Self; 6] = [Self::Eq, Self::Ne, Self::Gt, Self::Lt, Self::Ge, Self::Le];

    /// Stable string id, as persisted in rule definitions.
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Gt => "gt",
            Self::Lt => "lt",
            Self::Ge => "ge",
            Self::Le => "le",
        }
    }

    /// Mathematical symbol for display.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "≠",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Ge => "≥",
            Self::Le => "≤",
        }
    }

    /// Apply the comparison to two values.
    ///
    /// Equality is exact: snapshot values are already rounded at the source,
    /// so no tolerance is applied here.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn compare(self, a: f64, b: f64) -> bool {
        match self {
            Self::Eq => a == b,
            Self::Ne => a != b,
            Self::Gt => a > b,
            Self::Lt => a < b,
            Self::Ge => a >= b,
            Self::Le => a <= b,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for CompareOp {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.id() == s)
            .ok_or_else(|| ValidationError::UnknownOperator(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AccountId, EntityId};

    #[test]
    fn metric_ids_roundtrip_through_from_str() {
        for metric in Metric::ALL {
            let parsed: Metric = metric.id().parse().unwrap();
            assert_eq!(parsed, metric);
        }
    }

    #[test]
    fn unknown_metric_is_rejected() {
        let err = "cpm".parse::<Metric>().unwrap_err();
        assert!(matches!(err, ValidationError::UnknownMetric(_)));
    }

    #[test]
    fn metric_serde_uses_snake_case_ids() {
        let json = serde_json::to_string(&Metric::CostPerGoal).unwrap();
        assert_eq!(json, "\"cost_per_goal\"");
        let back: Metric = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Metric::CostPerGoal);
    }

    #[test]
    fn unknown_metric_fails_deserialization() {
        let result = serde_json::from_str::<Metric>("\"bounce_rate\"");
        assert!(result.is_err(), "unknown ids must fail at load time");
    }

    #[test]
    fn operator_comparisons() {
        assert!(CompareOp::Eq.compare(2.0, 2.0));
        assert!(CompareOp::Ne.compare(2.0, 3.0));
        assert!(CompareOp::Gt.compare(3.0, 2.0));
        assert!(CompareOp::Lt.compare(2.0, 3.0));
        assert!(CompareOp::Ge.compare(2.0, 2.0));
        assert!(CompareOp::Le.compare(1.0, 2.0));
        assert!(!CompareOp::Gt.compare(2.0, 2.0));
    }

    #[test]
    fn unknown_operator_is_rejected() {
        let err = "contains".parse::<CompareOp>().unwrap_err();
        assert!(matches!(err, ValidationError::UnknownOperator(_)));
    }

    #[test]
    fn roi_extraction_is_null_without_revenue() {
        let snapshot = MetricSnapshot {
            spent: 100.0,
            ..MetricSnapshot::new(EntityId::new(1), AccountId::new(1))
        };
        assert!(Metric::Roi.extract(&snapshot).is_none());
        assert_eq!(Metric::Spent.extract(&snapshot), Some(100.0));
    }
}
