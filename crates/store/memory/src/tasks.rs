use async_trait::async_trait;
use dashmap::DashMap;

use adpilot_core::{RuleRun, RunId};
use adpilot_store::{StoreError, TaskStore};

/// In-memory [`TaskStore`] backed by a [`DashMap`].
#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    runs: DashMap<RunId, RuleRun>,
}

impl MemoryTaskStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn upsert(&self, run: RuleRun) -> Result<(), StoreError> {
        self.runs.insert(run.id.clone(), run);
        Ok(())
    }

    async fn get(&self, id: &RunId) -> Result<Option<RuleRun>, StoreError> {
        Ok(self.runs.get(id).map(|entry| entry.value().clone()))
    }

    async fn list_active(&self) -> Result<Vec<RuleRun>, StoreError> {
        let mut active: Vec<RuleRun> = self
            .runs
            .iter()
            .filter(|entry| !entry.value().status.is_terminal())
            .map(|entry| entry.value().clone())
            .collect();
        active.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(active)
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<RuleRun>, StoreError> {
        let mut runs: Vec<RuleRun> = self.runs.iter().map(|entry| entry.value().clone()).collect();
        runs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        runs.truncate(limit);
        Ok(runs)
    }
}
