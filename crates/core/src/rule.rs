use std::collections::BTreeSet;

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::condition::Condition;
use crate::error::ValidationError;
use crate::metric::Metric;
use crate::snapshot::round2;
use crate::types::{AccountId, RuleId};

/// Fields shared by every rule domain.
///
/// Rules are evaluated in ascending priority order; the deterministic
/// tiebreak on equal priorities is the rule id. An empty `account_ids` set
/// means the rule applies to every account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    /// Unique rule identifier.
    pub id: RuleId,
    /// Human-readable name.
    pub name: String,
    /// Optional description of what this rule does.
    pub description: Option<String>,
    /// Whether the rule participates in evaluation.
    pub enabled: bool,
    /// Ordering key; lower values are evaluated first. Must be positive.
    pub priority: u32,
    /// Threshold checks combined with implicit AND. A rule with no
    /// conditions never matches.
    pub conditions: Vec<Condition>,
    /// Accounts the rule is scoped to. Empty means all accounts.
    #[serde(default)]
    pub account_ids: BTreeSet<AccountId>,
    /// When the rule was created.
    pub created_at: DateTime<Utc>,
    /// When the rule was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Rule {
    /// Create an enabled rule with a generated id and priority 1.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: RuleId::generate(),
            name: name.into(),
            description: None,
            enabled: true,
            priority: 1,
            conditions: Vec::new(),
            account_ids: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the priority.
    #[must_use]
    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the enabled state.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Append a condition.
    #[must_use]
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Scope the rule to an additional account.
    #[must_use]
    pub fn with_account(mut self, account_id: AccountId) -> Self {
        self.account_ids.insert(account_id);
        self
    }

    /// Whether the rule is scoped to the given account.
    #[must_use]
    pub fn applies_to(&self, account_id: AccountId) -> bool {
        self.account_ids.is_empty() || self.account_ids.contains(&account_id)
    }

    /// Whether any condition reads the given metric.
    #[must_use]
    pub fn references(&self, metric: Metric) -> bool {
        self.conditions.iter().any(|c| c.metric == metric)
    }

    /// Validate the shared fields. Called by every domain `validate`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if self.priority == 0 {
            return Err(ValidationError::InvalidPriority(self.priority));
        }
        Ok(())
    }
}

/// Tracking sub-field used to join attribution revenue onto banners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubField {
    Sub4,
    Sub5,
}

/// A rule that disables underperforming banners.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisableRule {
    /// Shared rule fields.
    #[serde(flatten)]
    pub rule: Rule,
    /// Which tracking sub-field to use for ROI enrichment.
    /// `None` unions revenue attributed through both sub-fields.
    #[serde(default)]
    pub roi_sub_field: Option<SubField>,
}

impl DisableRule {
    /// Create a disable rule around shared fields.
    #[must_use]
    pub fn new(rule: Rule) -> Self {
        Self {
            rule,
            roi_sub_field: None,
        }
    }

    /// Restrict ROI enrichment to a single sub-field.
    #[must_use]
    pub fn with_roi_sub_field(mut self, sub_field: SubField) -> Self {
        self.roi_sub_field = Some(sub_field);
        self
    }

    /// Validate the rule for persistence.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.rule.validate()
    }
}

/// Direction of a budget change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeDirection {
    Increase,
    Decrease,
}

/// Bounds on [`BudgetRule::change_percent`].
pub const BUDGET_PERCENT_RANGE: std::ops::RangeInclusive<u32> = 1..=20;

/// A rule that grows or shrinks ad-group budgets on its own daily schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetRule {
    /// Shared rule fields.
    #[serde(flatten)]
    pub rule: Rule,
    /// Relative budget change, percent of the current budget.
    pub change_percent: u32,
    /// Whether the budget grows or shrinks.
    pub change_direction: ChangeDirection,
    /// How many days of group-aggregated metrics to analyze.
    pub lookback_days: u32,
    /// Local wall-clock time at which this rule fires each day.
    pub schedule_time: NaiveTime,
}

impl BudgetRule {
    /// Create a budget rule with the given change.
    #[must_use]
    pub fn new(
        rule: Rule,
        change_percent: u32,
        change_direction: ChangeDirection,
        schedule_time: NaiveTime,
    ) -> Self {
        Self {
            rule,
            change_percent,
            change_direction,
            lookback_days: 7,
            schedule_time,
        }
    }

    /// Set the analysis window.
    #[must_use]
    pub fn with_lookback_days(mut self, days: u32) -> Self {
        self.lookback_days = days;
        self
    }

    /// The change percent clamped to its allowed range.
    ///
    /// Validation rejects out-of-range values at save time; the clamp keeps
    /// the invariant even for rows persisted before validation existed.
    #[must_use]
    pub fn effective_percent(&self) -> u32 {
        self.change_percent
            .clamp(*BUDGET_PERCENT_RANGE.start(), *BUDGET_PERCENT_RANGE.end())
    }

    /// Compute the new budget for a group, rounded to two decimals.
    #[must_use]
    pub fn new_budget(&self, old_budget: f64) -> f64 {
        let fraction = f64::from(self.effective_percent()) / 100.0;
        let factor = match self.change_direction {
            ChangeDirection::Increase => 1.0 + fraction,
            ChangeDirection::Decrease => 1.0 - fraction,
        };
        round2(old_budget * factor)
    }

    /// Validate the rule for persistence.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.rule.validate()?;
        if !BUDGET_PERCENT_RANGE.contains(&self.change_percent) {
            return Err(ValidationError::PercentOutOfRange(self.change_percent));
        }
        if self.lookback_days == 0 {
            return Err(ValidationError::InvalidLookback(self.lookback_days));
        }
        Ok(())
    }
}

/// Parse a `"HH:MM"` schedule time as stored by the configuration API.
pub fn parse_schedule_time(value: &str) -> Result<NaiveTime, ValidationError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| ValidationError::InvalidScheduleTime(value.to_owned()))
}

/// Bounds on [`ScalingConfig::duplicates_count`].
pub const DUPLICATES_RANGE: std::ops::RangeInclusive<u32> = 1..=100;

/// Configuration for duplicating ("scaling") profitable ad groups.
///
/// Reuses the shared rule fields for conditions, account scoping, and
/// ordering; there is no disable semantics attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct ScalingConfig {
    /// Shared rule fields.
    #[serde(flatten)]
    pub rule: Rule,
    /// How many copies of the ad group to create per trigger.
    pub duplicates_count: u32,
    /// Enable banners classified positive inside each duplicate.
    pub activate_positive_banners: bool,
    /// Copy banners classified negative into each duplicate.
    pub duplicate_negative_banners: bool,
    /// Enable copied negative banners. Only meaningful when
    /// `duplicate_negative_banners` is set.
    pub activate_negative_banners: bool,
    /// Create the duplicates under a new campaign instead of the original.
    pub duplicate_to_new_campaign: bool,
    /// Name for the new campaign, when one is created.
    #[serde(default)]
    pub new_campaign_name: Option<String>,
    /// Budget override applied to every duplicate.
    #[serde(default)]
    pub new_budget: Option<f64>,
    /// Name override applied to every duplicate.
    #[serde(default)]
    pub new_name: Option<String>,
}

impl ScalingConfig {
    /// Create a scaling config that copies one duplicate of positives only.
    #[must_use]
    pub fn new(rule: Rule) -> Self {
        Self {
            rule,
            duplicates_count: 1,
            activate_positive_banners: false,
            duplicate_negative_banners: false,
            activate_negative_banners: false,
            duplicate_to_new_campaign: false,
            new_campaign_name: None,
            new_budget: None,
            new_name: None,
        }
    }

    /// Set the duplicate count.
    #[must_use]
    pub fn with_duplicates_count(mut self, count: u32) -> Self {
        self.duplicates_count = count;
        self
    }

    /// The duplicate count clamped to its allowed range.
    #[must_use]
    pub fn effective_duplicates(&self) -> u32 {
        self.duplicates_count
            .clamp(*DUPLICATES_RANGE.start(), *DUPLICATES_RANGE.end())
    }

    /// Validate the config for persistence.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.rule.validate()?;
        if !DUPLICATES_RANGE.contains(&self.duplicates_count) {
            return Err(ValidationError::DuplicatesOutOfRange(self.duplicates_count));
        }
        if let Some(budget) = self.new_budget
            && budget <= 0.0
        {
            return Err(ValidationError::InvalidBudget(budget));
        }
        Ok(())
    }
}

/// Concrete overrides applied when an ad group is duplicated.
///
/// Produced by the scaling planner from a [`ScalingConfig`] and one group's
/// banner classification; consumed by the ad-platform client. Fields left
/// `None` keep the original group's values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateOverrides {
    /// Name for each duplicate.
    pub name: Option<String>,
    /// Budget for each duplicate.
    pub budget: Option<f64>,
    /// Create the duplicates under a new campaign.
    pub to_new_campaign: bool,
    /// Name of the new campaign, when one is created.
    pub campaign_name: Option<String>,
    /// Banners to copy into each duplicate, ascending id.
    pub include_banners: Vec<crate::types::BannerId>,
    /// Copied banners to enable inside each duplicate, ascending id.
    pub activate_banners: Vec<crate::types::BannerId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::{CompareOp, Metric};

    fn base_rule() -> Rule {
        Rule::new("stop-wasters")
            .with_condition(Condition::new(Metric::Spent, CompareOp::Ge, 100.0))
            .with_condition(Condition::new(Metric::Goals, CompareOp::Eq, 0.0))
    }

    #[test]
    fn rule_defaults() {
        let rule = Rule::new("r");
        assert!(rule.enabled);
        assert_eq!(rule.priority, 1);
        assert!(rule.account_ids.is_empty());
    }

    #[test]
    fn empty_account_set_applies_everywhere() {
        let rule = base_rule();
        assert!(rule.applies_to(AccountId::new(1)));
        assert!(rule.applies_to(AccountId::new(999)));
    }

    #[test]
    fn scoped_rule_applies_only_to_listed_accounts() {
        let rule = base_rule().with_account(AccountId::new(5));
        assert!(rule.applies_to(AccountId::new(5)));
        assert!(!rule.applies_to(AccountId::new(6)));
    }

    #[test]
    fn validation_rejects_zero_priority_and_empty_name() {
        let mut rule = base_rule().with_priority(0);
        assert_eq!(
            rule.validate().unwrap_err(),
            ValidationError::InvalidPriority(0)
        );
        rule.priority = 1;
        rule.name = "  ".into();
        assert_eq!(rule.validate().unwrap_err(), ValidationError::EmptyName);
    }

    #[test]
    fn references_roi() {
        let rule = base_rule().with_condition(Condition::new(Metric::Roi, CompareOp::Lt, 0.0));
        assert!(rule.references(Metric::Roi));
        assert!(!base_rule().references(Metric::Roi));
    }

    #[test]
    fn budget_rule_new_budget_decrease() {
        let rule = BudgetRule::new(
            base_rule(),
            10,
            ChangeDirection::Decrease,
            parse_schedule_time("09:30").unwrap(),
        );
        assert_eq!(rule.new_budget(1000.0), 900.0);
    }

    #[test]
    fn budget_rule_new_budget_increase_rounds() {
        let rule = BudgetRule::new(
            base_rule(),
            3,
            ChangeDirection::Increase,
            parse_schedule_time("00:00").unwrap(),
        );
        assert_eq!(rule.new_budget(333.33), 343.33);
    }

    #[test]
    fn budget_rule_validation_bounds() {
        let mut rule = BudgetRule::new(
            base_rule(),
            25,
            ChangeDirection::Increase,
            parse_schedule_time("12:00").unwrap(),
        );
        assert_eq!(
            rule.validate().unwrap_err(),
            ValidationError::PercentOutOfRange(25)
        );
        rule.change_percent = 20;
        rule.lookback_days = 0;
        assert_eq!(
            rule.validate().unwrap_err(),
            ValidationError::InvalidLookback(0)
        );
    }

    #[test]
    fn out_of_range_percent_is_clamped_for_computation() {
        let mut rule = BudgetRule::new(
            base_rule(),
            50,
            ChangeDirection::Increase,
            parse_schedule_time("12:00").unwrap(),
        );
        assert_eq!(rule.effective_percent(), 20);
        rule.change_percent = 0;
        assert_eq!(rule.effective_percent(), 1);
    }

    #[test]
    fn parse_schedule_time_accepts_hh_mm_only() {
        assert!(parse_schedule_time("08:15").is_ok());
        assert!(parse_schedule_time("8am").is_err());
        assert!(parse_schedule_time("25:00").is_err());
    }

    #[test]
    fn scaling_config_validation_bounds() {
        let mut config = ScalingConfig::new(base_rule()).with_duplicates_count(0);
        assert_eq!(
            config.validate().unwrap_err(),
            ValidationError::DuplicatesOutOfRange(0)
        );
        config.duplicates_count = 101;
        assert!(config.validate().is_err());
        config.duplicates_count = 100;
        assert!(config.validate().is_ok());

        config.new_budget = Some(-5.0);
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::InvalidBudget(_)
        ));
    }

    #[test]
    fn disable_rule_serde_roundtrip() {
        let rule = DisableRule::new(base_rule()).with_roi_sub_field(SubField::Sub4);
        let json = serde_json::to_string(&rule).unwrap();
        let back: DisableRule = serde_json::from_str(&json).unwrap();
        assert_eq!(back.roi_sub_field, Some(SubField::Sub4));
        assert_eq!(back.rule.conditions.len(), 2);
    }

    #[test]
    fn disable_rule_sub_field_defaults_to_both() {
        let rule = DisableRule::new(base_rule());
        let mut json: serde_json::Value = serde_json::to_value(&rule).unwrap();
        json.as_object_mut().unwrap().remove("roi_sub_field");
        let back: DisableRule = serde_json::from_value(json).unwrap();
        assert!(back.roi_sub_field.is_none());
    }
}
