use async_trait::async_trait;

use adpilot_core::{RuleRun, RunId};

use crate::error::StoreError;

/// Persistence for rule-run task snapshots.
///
/// The tracker upserts after every entity, so UI progress widgets read the
/// latest state from here. Entries are whole-row replacements keyed by run
/// id; history retention is a backend concern.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Insert or replace a run snapshot.
    async fn upsert(&self, run: RuleRun) -> Result<(), StoreError>;

    /// Fetch a run by id.
    async fn get(&self, id: &RunId) -> Result<Option<RuleRun>, StoreError>;

    /// Runs that have not reached a terminal status.
    async fn list_active(&self) -> Result<Vec<RuleRun>, StoreError>;

    /// Most recent runs, newest first, bounded by `limit`.
    async fn list_recent(&self, limit: usize) -> Result<Vec<RuleRun>, StoreError>;
}
