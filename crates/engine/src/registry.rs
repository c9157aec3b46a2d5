use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio_util::sync::CancellationToken;

use adpilot_core::{RuleId, RunId};

use crate::error::EngineError;

/// Serializes runs per rule and tracks cancellation tokens per run.
///
/// A rule id never has two concurrent runs: the registry holds one mutex
/// per rule, and a trigger that arrives while the lock is held is rejected
/// with [`EngineError::RunInProgress`] rather than queued, so stale
/// scheduler ticks cannot pile up behind a slow run.
#[derive(Debug, Default)]
pub struct RunRegistry {
    locks: DashMap<RuleId, Arc<Mutex<()>>>,
    tokens: Arc<DashMap<RunId, CancellationToken>>,
}

/// Held for the duration of one run. Dropping releases the rule lock and
/// unregisters the cancellation token.
#[derive(Debug)]
pub struct RunGuard {
    tokens: Arc<DashMap<RunId, CancellationToken>>,
    run_id: RunId,
    token: CancellationToken,
    _lock: OwnedMutexGuard<()>,
}

impl RunGuard {
    /// The cancellation token for this run.
    #[must_use]
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.tokens.remove(&self.run_id);
    }
}

/// Holds just a rule's lock, with no cancellation token of its own. Used
/// for the additional rules a combined run covers beyond the one it is
/// tracked under.
pub struct RuleLock {
    _lock: OwnedMutexGuard<()>,
}

impl RunRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn try_lock(&self, rule_id: &RuleId) -> Result<OwnedMutexGuard<()>, EngineError> {
        let lock = self
            .locks
            .entry(rule_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.try_lock_owned()
            .map_err(|_| EngineError::RunInProgress(rule_id.clone()))
    }

    /// Acquire a rule's lock without registering a cancellation token.
    pub fn lock_rule(&self, rule_id: &RuleId) -> Result<RuleLock, EngineError> {
        Ok(RuleLock {
            _lock: self.try_lock(rule_id)?,
        })
    }

    /// Try to begin a run for a rule.
    ///
    /// Returns a guard holding the rule lock, or
    /// [`EngineError::RunInProgress`] when another run holds it.
    pub fn begin(&self, rule_id: &RuleId, run_id: &RunId) -> Result<RunGuard, EngineError> {
        let guard = self.try_lock(rule_id)?;
        let token = CancellationToken::new();
        self.tokens.insert(run_id.clone(), token.clone());
        Ok(RunGuard {
            tokens: Arc::clone(&self.tokens),
            run_id: run_id.clone(),
            token,
            _lock: guard,
        })
    }

    /// Request cancellation of an active run. Returns `false` when the run
    /// is unknown or already finished.
    pub fn cancel(&self, run_id: &RunId) -> bool {
        match self.tokens.get(run_id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Number of currently active runs.
    #[must_use]
    pub fn active_runs(&self) -> usize {
        self.tokens.len()
    }
}
