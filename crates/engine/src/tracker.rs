use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use adpilot_core::{RuleDomain, RuleId, RuleRun, RunId};
use adpilot_store::TaskStore;

use crate::error::EngineError;

/// Tracks one rule run as a cancellable background task.
///
/// Every state change is persisted through the [`TaskStore`], so progress
/// widgets always see the latest snapshot. Cancellation is cooperative: the
/// run loop calls [`TaskTracker::is_cancelled`] between entities and never
/// pre-empts an in-flight platform call.
pub struct TaskTracker {
    run: RuleRun,
    store: Arc<dyn TaskStore>,
    token: CancellationToken,
}

impl TaskTracker {
    /// Create a pending run under a caller-supplied run id and persist its
    /// initial snapshot. The id is generated before the tracker so the
    /// run's registry slot can be claimed first.
    pub async fn create(
        run_id: RunId,
        rule_id: RuleId,
        domain: RuleDomain,
        dry_run: bool,
        store: Arc<dyn TaskStore>,
        token: CancellationToken,
    ) -> Result<Self, EngineError> {
        let mut run = RuleRun::new(rule_id, domain, dry_run);
        run.id = run_id;
        store.upsert(run.clone()).await?;
        Ok(Self { run, store, token })
    }

    /// The run id.
    #[must_use]
    pub fn run_id(&self) -> &RunId {
        &self.run.id
    }

    /// The current run snapshot.
    #[must_use]
    pub fn run(&self) -> &RuleRun {
        &self.run
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Move to `Running` with the number of entities to process.
    pub async fn start(&mut self, total: u64) -> Result<(), EngineError> {
        self.run.start(total)?;
        self.persist().await
    }

    /// Record one entity's outcome and persist progress.
    pub async fn record_entity(&mut self, success: bool) -> Result<(), EngineError> {
        self.run.record_entity(success);
        self.persist().await
    }

    /// Update the operator-visible step description.
    pub async fn set_step(&mut self, step: impl Into<String>) -> Result<(), EngineError> {
        self.run.set_step(step);
        self.persist().await
    }

    /// Mark the run complete.
    pub async fn complete(&mut self) -> Result<(), EngineError> {
        self.run.complete()?;
        debug!(run = %self.run.id, succeeded = self.run.succeeded, failed = self.run.failed, "run completed");
        self.persist().await
    }

    /// Mark the run failed with an operator-visible reason.
    pub async fn fail(&mut self, reason: impl Into<String>) -> Result<(), EngineError> {
        self.run.fail(reason)?;
        self.persist().await
    }

    /// Mark the run cancelled.
    pub async fn cancel(&mut self) -> Result<(), EngineError> {
        self.run.cancel()?;
        debug!(run = %self.run.id, completed = self.run.completed, "run cancelled");
        self.persist().await
    }

    async fn persist(&self) -> Result<(), EngineError> {
        self.store.upsert(self.run.clone()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adpilot_core::RunStatus;
    use adpilot_store_memory::MemoryTaskStore;

    async fn tracker(store: Arc<MemoryTaskStore>, token: CancellationToken) -> TaskTracker {
        TaskTracker::create(
            RunId::generate(),
            RuleId::generate(),
            RuleDomain::Disable,
            false,
            store,
            token,
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn every_change_is_persisted() {
        let store = Arc::new(MemoryTaskStore::new());
        let mut t = tracker(Arc::clone(&store), CancellationToken::new()).await;

        let stored = store.get(t.run_id()).await.unwrap().unwrap();
        assert_eq!(stored.status, RunStatus::Pending);

        t.start(2).await.unwrap();
        t.record_entity(true).await.unwrap();
        let stored = store.get(t.run_id()).await.unwrap().unwrap();
        assert_eq!(stored.status, RunStatus::Running);
        assert_eq!(stored.completed, 1);

        t.record_entity(false).await.unwrap();
        t.complete().await.unwrap();
        let stored = store.get(t.run_id()).await.unwrap().unwrap();
        assert_eq!(stored.status, RunStatus::Completed);
        assert_eq!(stored.succeeded, 1);
        assert_eq!(stored.failed, 1);
    }

    #[tokio::test]
    async fn cancellation_is_observable() {
        let store = Arc::new(MemoryTaskStore::new());
        let token = CancellationToken::new();
        let mut t = tracker(Arc::clone(&store), token.clone()).await;
        t.start(5).await.unwrap();

        assert!(!t.is_cancelled());
        token.cancel();
        assert!(t.is_cancelled());

        t.cancel().await.unwrap();
        let stored = store.get(t.run_id()).await.unwrap().unwrap();
        assert_eq!(stored.status, RunStatus::Cancelled);
    }
}
