use std::collections::HashMap;

use tracing::{debug, warn};

use adpilot_core::{AccountId, MetricSnapshot, SubField};
use adpilot_platform::{AttributionProvider, RevenueRow};

/// Attributed revenue for one account's banners, indexed by tracking id.
///
/// Built once per run from the attribution provider's rows; rules then look
/// revenue up under their own sub-field selection. A failed fetch yields an
/// empty index (fail-open): ROI stays null for the run and ROI-conditioned
/// rules simply do not fire, while non-ROI rules are unaffected.
#[derive(Debug, Default)]
pub struct RevenueIndex {
    by_tracking_id: HashMap<String, f64>,
}

impl RevenueIndex {
    /// Build an index from revenue rows, summing rows that share a
    /// tracking id.
    #[must_use]
    pub fn from_rows(rows: Vec<RevenueRow>) -> Self {
        let mut by_tracking_id: HashMap<String, f64> = HashMap::new();
        for row in rows {
            *by_tracking_id.entry(row.tracking_id).or_insert(0.0) += row.amount;
        }
        Self { by_tracking_id }
    }

    /// Fetch rows from the attribution provider and build the index.
    ///
    /// Attribution latency or failure must not abort evaluation: errors are
    /// logged and an empty index is returned.
    pub async fn fetch(
        attribution: &dyn AttributionProvider,
        account_id: AccountId,
        lookback_days: u32,
    ) -> Self {
        match attribution.fetch_revenue(account_id, lookback_days).await {
            Ok(rows) => {
                debug!(account = %account_id, rows = rows.len(), "attribution rows fetched");
                Self::from_rows(rows)
            }
            Err(err) => {
                warn!(
                    account = %account_id,
                    error = %err,
                    "attribution fetch failed, ROI stays null for this run"
                );
                Self::default()
            }
        }
    }

    /// Attributed revenue for a snapshot under a sub-field selection.
    ///
    /// With a specific sub-field, only that field's tracking value is
    /// consulted. With `None`, both sub-fields are unioned: when they carry
    /// the same tracking value the row set is counted once, not twice.
    /// Returns `None` when no revenue row maps to the entity.
    #[must_use]
    pub fn revenue_for(
        &self,
        snapshot: &MetricSnapshot,
        sub_field: Option<SubField>,
    ) -> Option<f64> {
        let keys: Vec<&String> = match sub_field {
            Some(SubField::Sub4) => snapshot.sub4.iter().collect(),
            Some(SubField::Sub5) => snapshot.sub5.iter().collect(),
            None => {
                let mut keys: Vec<&String> =
                    snapshot.sub4.iter().chain(snapshot.sub5.iter()).collect();
                keys.dedup();
                keys
            }
        };

        let mut total = None;
        for key in keys {
            if let Some(amount) = self.by_tracking_id.get(key) {
                *total.get_or_insert(0.0) += amount;
            }
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adpilot_core::{AccountId, EntityId};

    fn row(tracking_id: &str, amount: f64) -> RevenueRow {
        RevenueRow {
            tracking_id: tracking_id.into(),
            amount,
        }
    }

    fn snapshot(sub4: Option<&str>, sub5: Option<&str>) -> MetricSnapshot {
        MetricSnapshot {
            sub4: sub4.map(Into::into),
            sub5: sub5.map(Into::into),
            ..MetricSnapshot::new(EntityId::new(1), AccountId::new(1))
        }
    }

    #[test]
    fn rows_with_same_tracking_id_are_summed() {
        let index = RevenueIndex::from_rows(vec![row("a", 10.0), row("a", 5.0)]);
        let snap = snapshot(Some("a"), None);
        assert_eq!(index.revenue_for(&snap, Some(SubField::Sub4)), Some(15.0));
    }

    #[test]
    fn specific_sub_field_ignores_the_other() {
        let index = RevenueIndex::from_rows(vec![row("a", 10.0), row("b", 20.0)]);
        let snap = snapshot(Some("a"), Some("b"));
        assert_eq!(index.revenue_for(&snap, Some(SubField::Sub4)), Some(10.0));
        assert_eq!(index.revenue_for(&snap, Some(SubField::Sub5)), Some(20.0));
    }

    #[test]
    fn both_sub_fields_union_when_unset() {
        let index = RevenueIndex::from_rows(vec![row("a", 10.0), row("b", 20.0)]);
        let snap = snapshot(Some("a"), Some("b"));
        assert_eq!(index.revenue_for(&snap, None), Some(30.0));
    }

    #[test]
    fn identical_sub_field_values_are_not_double_counted() {
        let index = RevenueIndex::from_rows(vec![row("a", 10.0)]);
        let snap = snapshot(Some("a"), Some("a"));
        assert_eq!(index.revenue_for(&snap, None), Some(10.0));
    }

    #[test]
    fn no_matching_row_means_null_revenue() {
        let index = RevenueIndex::from_rows(vec![row("x", 10.0)]);
        let snap = snapshot(Some("a"), Some("b"));
        assert!(index.revenue_for(&snap, None).is_none());
        assert!(index.revenue_for(&snapshot(None, None), None).is_none());
    }

    #[test]
    fn empty_index_always_returns_none() {
        let index = RevenueIndex::default();
        let snap = snapshot(Some("a"), None);
        assert!(index.revenue_for(&snap, None).is_none());
    }
}
