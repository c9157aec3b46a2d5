use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use adpilot_core::{AccountId, AdGroupId, BannerId, DuplicateOverrides, MetricSnapshot};

use crate::error::PlatformError;

/// Which entity granularity a metrics fetch should aggregate to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityScope {
    /// One snapshot per banner.
    Banner,
    /// One snapshot per ad group, counters aggregated over its banners.
    AdGroup,
    /// One snapshot per campaign.
    Campaign,
}

/// One externally attributed revenue row.
///
/// `tracking_id` carries the value of a tracking sub-field (`sub4`/`sub5`)
/// that banners were tagged with; the ROI enricher joins rows onto
/// snapshots through it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueRow {
    /// The tracking sub-field value identifying the banner.
    pub tracking_id: String,
    /// Attributed revenue amount.
    pub amount: f64,
}

/// Mutating client for the external ad platform.
///
/// Implementations wrap the platform's HTTP API; the engine only sees this
/// seam. All methods are subject to the platform's rate limits -- the
/// executor owns retry and backoff, implementations must not retry
/// internally.
#[async_trait]
pub trait AdPlatformClient: Send + Sync {
    /// Enable or disable a banner.
    async fn set_enabled(&self, banner_id: BannerId, enabled: bool) -> Result<(), PlatformError>;

    /// Set an ad group's budget.
    async fn set_budget(&self, group_id: AdGroupId, amount: f64) -> Result<(), PlatformError>;

    /// Duplicate an ad group `copies` times with the given overrides.
    /// Returns the ids of the created groups.
    async fn duplicate_group(
        &self,
        group_id: AdGroupId,
        copies: u32,
        overrides: &DuplicateOverrides,
    ) -> Result<Vec<AdGroupId>, PlatformError>;
}

/// Read side of the ad platform: performance snapshots.
#[async_trait]
pub trait MetricsProvider: Send + Sync {
    /// Fetch per-entity snapshots for an account over a lookback window.
    async fn fetch(
        &self,
        account_id: AccountId,
        scope: EntityScope,
        lookback_days: u32,
    ) -> Result<Vec<MetricSnapshot>, PlatformError>;
}

/// External attribution source for revenue enrichment.
#[async_trait]
pub trait AttributionProvider: Send + Sync {
    /// Fetch attributed revenue rows for an account's tracked banners.
    ///
    /// The rows are keyed by tracking sub-field values; which sub-field a
    /// given rule joins through is decided by the enricher.
    async fn fetch_revenue(
        &self,
        account_id: AccountId,
        lookback_days: u32,
    ) -> Result<Vec<RevenueRow>, PlatformError>;
}
