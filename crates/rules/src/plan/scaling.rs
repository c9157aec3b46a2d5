use adpilot_core::{
    AccountId, AdGroupId, BannerId, DuplicateOverrides, MetricSnapshot, RuleId, ScalingConfig,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::matcher::evaluate;

/// Per-banner classification of one ad group under a scaling config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    /// Banners matching ALL of the config's conditions, ascending id.
    pub positive: Vec<BannerId>,
    /// The remaining banners, ascending id.
    pub negative: Vec<BannerId>,
}

impl Classification {
    /// The group is eligible for duplication iff at least one banner is
    /// positive.
    #[must_use]
    pub fn is_eligible(&self) -> bool {
        !self.positive.is_empty()
    }
}

/// A planned duplication of one ad group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicationPlan {
    /// The source ad group.
    pub group_id: AdGroupId,
    /// The scaling config that produced the plan.
    pub config_id: RuleId,
    /// How many copies to create.
    pub copies: u32,
    /// Overrides applied uniformly to every copy.
    pub overrides: DuplicateOverrides,
}

/// Classify every banner of a group independently.
///
/// A banner is positive when ALL of the config's conditions hold for its
/// snapshot; anything else (including a null-valued metric) is negative.
/// Account scoping and the enabled flag gate the whole config, not
/// individual banners, so classification looks only at conditions.
#[must_use]
pub fn classify_group(config: &ScalingConfig, banners: &[MetricSnapshot]) -> Classification {
    let mut sorted: Vec<&MetricSnapshot> = banners.iter().collect();
    sorted.sort_by_key(|s| s.entity_id);

    let mut classification = Classification::default();
    for snapshot in sorted {
        let banner = BannerId::new(snapshot.entity_id.get());
        let positive = !config.rule.conditions.is_empty()
            && config
                .rule
                .conditions
                .iter()
                .all(|c| evaluate(c, snapshot));
        if positive {
            classification.positive.push(banner);
        } else {
            classification.negative.push(banner);
        }
    }
    classification
}

/// Build a duplication plan for one group, or `None` when the group is not
/// eligible (no positive banner) or the config does not apply.
#[must_use]
pub fn plan_duplication(
    config: &ScalingConfig,
    account_id: AccountId,
    group_id: AdGroupId,
    banners: &[MetricSnapshot],
) -> Option<DuplicationPlan> {
    if !config.rule.enabled || !config.rule.applies_to(account_id) {
        return None;
    }
    let classification = classify_group(config, banners);
    if !classification.is_eligible() {
        debug!(group = %group_id, config = %config.rule.id, "no positive banner, group skipped");
        return None;
    }
    Some(DuplicationPlan {
        group_id,
        config_id: config.rule.id.clone(),
        copies: config.effective_duplicates(),
        overrides: build_overrides(config, &classification),
    })
}

/// Build a plan for manual duplication: the operator named the groups
/// explicitly, so condition evaluation is bypassed and every banner is
/// copied verbatim with no activation changes.
#[must_use]
pub fn plan_manual_duplication(config: &ScalingConfig, group_id: AdGroupId) -> DuplicationPlan {
    DuplicationPlan {
        group_id,
        config_id: config.rule.id.clone(),
        copies: config.effective_duplicates(),
        overrides: DuplicateOverrides {
            name: config.new_name.clone(),
            budget: config.new_budget,
            to_new_campaign: config.duplicate_to_new_campaign,
            campaign_name: config.new_campaign_name.clone(),
            include_banners: Vec::new(),
            activate_banners: Vec::new(),
        },
    }
}

fn build_overrides(config: &ScalingConfig, classification: &Classification) -> DuplicateOverrides {
    let mut include = classification.positive.clone();
    if config.duplicate_negative_banners {
        include.extend(classification.negative.iter().copied());
        include.sort_unstable();
    }

    let mut activate = Vec::new();
    if config.activate_positive_banners {
        activate.extend(classification.positive.iter().copied());
    }
    // Negative activation only applies to banners that are actually copied.
    if config.duplicate_negative_banners && config.activate_negative_banners {
        activate.extend(classification.negative.iter().copied());
        activate.sort_unstable();
    }

    DuplicateOverrides {
        name: config.new_name.clone(),
        budget: config.new_budget,
        to_new_campaign: config.duplicate_to_new_campaign,
        campaign_name: config.new_campaign_name.clone(),
        include_banners: include,
        activate_banners: activate,
    }
}
