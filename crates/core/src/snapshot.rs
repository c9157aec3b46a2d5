use serde::{Deserialize, Serialize};

use crate::types::{AccountId, AdGroupId, CampaignId, EntityId};

/// Round a monetary or percentage value to two decimal places.
///
/// All derived metric values and computed budgets go through this helper so
/// that equality comparisons in conditions operate on stable inputs.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Per-entity performance values at analysis time.
///
/// A snapshot is produced by the metrics provider for one banner or one ad
/// group (group-aggregated), over the lookback window of the triggering
/// rule. Raw counters are stored as fetched; derived metrics (`ctr`, `cpc`,
/// `cr`, `cost_per_goal`, `roi_percent`) are computed on demand and return
/// `None` when their denominator is zero or, for ROI, when no attributed
/// revenue is known.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSnapshot {
    /// The banner or ad group this snapshot describes.
    pub entity_id: EntityId,

    /// Account (cabinet) the entity belongs to.
    pub account_id: AccountId,

    /// Parent ad group, when the entity is a banner.
    pub group_id: Option<AdGroupId>,

    /// Parent campaign, when known.
    pub campaign_id: Option<CampaignId>,

    /// Whether the entity is currently enabled on the platform.
    pub enabled: bool,

    /// Current budget, for group-scoped snapshots.
    pub budget: Option<f64>,

    /// Money spent over the lookback window.
    pub spent: f64,

    /// Clicks over the lookback window.
    pub clicks: u64,

    /// Impressions over the lookback window.
    pub shows: u64,

    /// Conversion goals reached over the lookback window.
    pub goals: u64,

    /// Externally attributed revenue, filled in by the ROI enricher.
    /// `None` until enrichment runs, or when no revenue row maps to this
    /// entity.
    pub lt_revenue: Option<f64>,

    /// Tracking sub-field values used to join attribution revenue rows.
    pub sub4: Option<String>,
    pub sub5: Option<String>,
}

impl MetricSnapshot {
    /// Create a snapshot with zeroed counters for the given entity.
    #[must_use]
    pub fn new(entity_id: impl Into<EntityId>, account_id: AccountId) -> Self {
        Self {
            entity_id: entity_id.into(),
            account_id,
            group_id: None,
            campaign_id: None,
            enabled: true,
            budget: None,
            spent: 0.0,
            clicks: 0,
            shows: 0,
            goals: 0,
            lt_revenue: None,
            sub4: None,
            sub5: None,
        }
    }

    /// Click-through rate in percent, `None` without impressions.
    #[must_use]
    pub fn ctr(&self) -> Option<f64> {
        ratio(self.clicks, self.shows).map(|r| round2(r * 100.0))
    }

    /// Cost per click, `None` without clicks.
    #[must_use]
    pub fn cpc(&self) -> Option<f64> {
        if self.clicks == 0 {
            None
        } else {
            Some(round2(self.spent / approx(self.clicks)))
        }
    }

    /// Conversion rate in percent (goals per click), `None` without clicks.
    #[must_use]
    pub fn cr(&self) -> Option<f64> {
        ratio(self.goals, self.clicks).map(|r| round2(r * 100.0))
    }

    /// Cost per conversion goal, `None` without goals.
    #[must_use]
    pub fn cost_per_goal(&self) -> Option<f64> {
        if self.goals == 0 {
            None
        } else {
            Some(round2(self.spent / approx(self.goals)))
        }
    }

    /// Attributed profit: `lt_revenue - spent`. `None` until enriched.
    #[must_use]
    pub fn profit(&self) -> Option<f64> {
        self.lt_revenue.map(|rev| round2(rev - self.spent))
    }

    /// Return on investment in percent: `profit / spent * 100`.
    ///
    /// `None` when revenue is unknown or nothing was spent.
    #[must_use]
    pub fn roi_percent(&self) -> Option<f64> {
        if self.spent <= 0.0 {
            return None;
        }
        self.profit().map(|p| round2(p / self.spent * 100.0))
    }
}

// Counter values stay far below 2^52 in practice, so the f64 conversion is
// exact for any input the platform can return.
#[allow(clippy::cast_precision_loss)]
fn approx(count: u64) -> f64 {
    count as f64
}

fn ratio(numerator: u64, denominator: u64) -> Option<f64> {
    if denominator == 0 {
        None
    } else {
        Some(approx(numerator) / approx(denominator))
    }
}
