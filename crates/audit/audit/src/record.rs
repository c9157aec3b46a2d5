use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use adpilot_core::{AccountId, AdGroupId, EntityId, RuleId, RunId};

/// What kind of mutation an entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Disable,
    SetBudget,
    DuplicateGroup,
}

/// The before/after value captured by a change-log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangedValue {
    /// Enabled state of a banner.
    Enabled(bool),
    /// Budget of an ad group.
    Budget(f64),
    /// Ad groups created by a duplication.
    Groups(Vec<AdGroupId>),
}

/// One immutable audit record per action attempt.
///
/// Entries are append-only: they are written exactly once by the executor
/// and never updated afterwards. The retry count of the attempt is captured
/// in `attempts`; retries do not produce additional entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeLogEntry {
    /// Unique identifier for this entry.
    pub id: String,
    /// The run this entry belongs to.
    pub run_id: RunId,
    /// The rule whose action was attempted.
    pub rule_id: RuleId,
    /// The account the entity belongs to.
    pub account_id: AccountId,
    /// The banner or ad group acted on.
    pub entity_id: EntityId,
    /// What kind of mutation was attempted.
    pub action: ActionKind,
    /// Value before the action, when known.
    pub old_value: Option<ChangedValue>,
    /// Value after the action (or the value that would have been written,
    /// for dry runs).
    pub new_value: Option<ChangedValue>,
    /// Whether the action succeeded.
    pub success: bool,
    /// Error message for failed actions.
    pub error: Option<String>,
    /// Number of attempts made, including retries.
    pub attempts: u32,
    /// Whether the mutating call was suppressed.
    pub dry_run: bool,
    /// When the entry was written.
    pub created_at: DateTime<Utc>,
}

impl ChangeLogEntry {
    /// Create an entry with a generated id, stamped now.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        run_id: RunId,
        rule_id: RuleId,
        account_id: AccountId,
        entity_id: EntityId,
        action: ActionKind,
        success: bool,
        attempts: u32,
        dry_run: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            run_id,
            rule_id,
            account_id,
            entity_id,
            action,
            old_value: None,
            new_value: None,
            success,
            error: None,
            attempts,
            dry_run,
            created_at: Utc::now(),
        }
    }

    /// Attach before/after values.
    #[must_use]
    pub fn with_values(
        mut self,
        old_value: Option<ChangedValue>,
        new_value: Option<ChangedValue>,
    ) -> Self {
        self.old_value = old_value;
        self.new_value = new_value;
        self
    }

    /// Attach an error message.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Filters and pagination for change-log queries.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ChangeLogQuery {
    /// Filter by run.
    pub run_id: Option<RunId>,
    /// Filter by rule.
    pub rule_id: Option<RuleId>,
    /// Filter by account.
    pub account_id: Option<AccountId>,
    /// Filter by entity.
    pub entity_id: Option<EntityId>,
    /// Filter by action kind.
    pub action: Option<ActionKind>,
    /// Filter by success flag.
    pub success: Option<bool>,
    /// Only entries created at or after this time.
    pub from: Option<DateTime<Utc>>,
    /// Only entries created at or before this time.
    pub to: Option<DateTime<Utc>>,
    /// Maximum number of entries to return (default 50, max 1000).
    pub limit: Option<u32>,
    /// Number of entries to skip for pagination.
    pub offset: Option<u32>,
}

impl ChangeLogQuery {
    /// Return the effective limit, clamped to 1..=1000, defaulting to 50.
    #[must_use]
    pub fn effective_limit(&self) -> u32 {
        self.limit.unwrap_or(50).clamp(1, 1000)
    }

    /// Return the effective offset, defaulting to 0.
    #[must_use]
    pub fn effective_offset(&self) -> u32 {
        self.offset.unwrap_or(0)
    }

    /// Whether an entry passes every set filter.
    #[must_use]
    pub fn matches(&self, entry: &ChangeLogEntry) -> bool {
        self.run_id.as_ref().is_none_or(|v| *v == entry.run_id)
            && self.rule_id.as_ref().is_none_or(|v| *v == entry.rule_id)
            && self.account_id.is_none_or(|v| v == entry.account_id)
            && self.entity_id.is_none_or(|v| v == entry.entity_id)
            && self.action.is_none_or(|v| v == entry.action)
            && self.success.is_none_or(|v| v == entry.success)
            && self.from.is_none_or(|v| entry.created_at >= v)
            && self.to.is_none_or(|v| entry.created_at <= v)
    }
}

/// A paginated page of change-log entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeLogPage {
    /// The entries matching the query.
    pub entries: Vec<ChangeLogEntry>,
    /// Total number of entries matching the query (before pagination).
    pub total: u64,
    /// The limit used for this page.
    pub limit: u32,
    /// The offset used for this page.
    pub offset: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(success: bool) -> ChangeLogEntry {
        ChangeLogEntry::new(
            RunId::generate(),
            RuleId::generate(),
            AccountId::new(1),
            EntityId::new(10),
            ActionKind::Disable,
            success,
            1,
            false,
        )
    }

    #[test]
    fn builder_attaches_values_and_error() {
        let e = entry(false)
            .with_values(
                Some(ChangedValue::Enabled(true)),
                Some(ChangedValue::Enabled(false)),
            )
            .with_error("rate limited");
        assert_eq!(e.old_value, Some(ChangedValue::Enabled(true)));
        assert_eq!(e.error.as_deref(), Some("rate limited"));
    }

    #[test]
    fn query_limit_clamps() {
        let mut q = ChangeLogQuery::default();
        assert_eq!(q.effective_limit(), 50);
        q.limit = Some(0);
        assert_eq!(q.effective_limit(), 1);
        q.limit = Some(10_000);
        assert_eq!(q.effective_limit(), 1000);
    }

    #[test]
    fn query_filters_combine() {
        let e = entry(true);
        let mut q = ChangeLogQuery {
            success: Some(true),
            account_id: Some(AccountId::new(1)),
            ..ChangeLogQuery::default()
        };
        assert!(q.matches(&e));
        q.success = Some(false);
        assert!(!q.matches(&e));
    }

    #[test]
    fn entry_serde_roundtrip() {
        let e = entry(true).with_values(None, Some(ChangedValue::Budget(900.0)));
        let json = serde_json::to_string(&e).unwrap();
        let back: ChangeLogEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, e.id);
        assert_eq!(back.new_value, Some(ChangedValue::Budget(900.0)));
    }
}
