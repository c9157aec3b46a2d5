use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, instrument, warn};

use adpilot_audit::{ActionKind, AuditError, ChangeLogEntry, ChangeLogStore, ChangedValue};
use adpilot_platform::{AdPlatformClient, PlatformError};
use adpilot_store::{StoreError, WhitelistStore};

use crate::action::{ActionRequest, ExecutionOutcome, PlatformAction};
use crate::config::ExecutorConfig;

/// Errors that abort a run instead of failing a single entity.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The platform rejected our credentials; no further calls can succeed.
    #[error("fatal platform error: {0}")]
    Fatal(PlatformError),

    /// The change log could not be written.
    #[error(transparent)]
    Audit(#[from] AuditError),

    /// The whitelist could not be consulted.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Performs planned actions against the ad platform.
///
/// One `perform` call covers one entity: it re-checks the whitelist for
/// disables, honors dry-run, runs the bounded retry loop with backoff on
/// transient errors, and appends exactly one [`ChangeLogEntry`] for every
/// attempted action. Fatal (authentication) errors are returned as
/// [`ExecutorError::Fatal`] so the caller aborts the whole run.
pub struct ActionExecutor {
    client: Arc<dyn AdPlatformClient>,
    whitelist: Arc<dyn WhitelistStore>,
    change_log: Arc<dyn ChangeLogStore>,
    config: ExecutorConfig,
    semaphore: Arc<Semaphore>,
}

impl ActionExecutor {
    /// Create an executor over the given collaborators.
    pub fn new(
        client: Arc<dyn AdPlatformClient>,
        whitelist: Arc<dyn WhitelistStore>,
        change_log: Arc<dyn ChangeLogStore>,
        config: ExecutorConfig,
    ) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent));
        Self {
            client,
            whitelist,
            change_log,
            config,
            semaphore,
        }
    }

    /// Return a reference to the executor configuration.
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Perform one planned action.
    #[instrument(skip(self, request), fields(entity = %request.action.entity_id(), rule = %request.rule_id))]
    pub async fn perform(&self, request: &ActionRequest) -> Result<ExecutionOutcome, ExecutorError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .expect("semaphore is never closed");

        // Re-check the whitelist right before a disable: the set may have
        // changed since the plan was computed.
        if let PlatformAction::Disable { banner_id, .. } = request.action {
            if self.whitelist.contains(banner_id).await? {
                debug!(banner = %banner_id, "banner whitelisted since planning, skipping");
                return Ok(ExecutionOutcome::SkippedWhitelisted);
            }
        }

        // Disabling an already-disabled banner is a successful no-op; no
        // platform call is made and no retry budget is spent.
        if let PlatformAction::Disable {
            already_disabled: true,
            ..
        } = request.action
        {
            let entry = self
                .base_entry(request, true, 0)
                .with_values(Some(ChangedValue::Enabled(false)), Some(ChangedValue::Enabled(false)));
            self.change_log.append(entry.clone()).await?;
            return Ok(ExecutionOutcome::Executed(entry));
        }

        if request.dry_run {
            let (old_value, new_value) = planned_values(&request.action);
            let entry = self
                .base_entry(request, true, 0)
                .with_values(old_value, new_value);
            self.change_log.append(entry.clone()).await?;
            return Ok(ExecutionOutcome::Executed(entry));
        }

        self.perform_with_retries(request).await
    }

    async fn perform_with_retries(
        &self,
        request: &ActionRequest,
    ) -> Result<ExecutionOutcome, ExecutorError> {
        let mut attempt = 0;
        loop {
            debug!(attempt, max_retries = self.config.max_retries, "calling platform");
            let result = tokio::time::timeout(self.config.call_timeout, self.dispatch(&request.action))
                .await
                .unwrap_or(Err(PlatformError::Timeout(self.config.call_timeout)));

            match result {
                Ok(new_value) => {
                    let (old_value, _) = planned_values(&request.action);
                    let entry = self
                        .base_entry(request, true, attempt + 1)
                        .with_values(old_value, Some(new_value));
                    self.change_log.append(entry.clone()).await?;
                    return Ok(ExecutionOutcome::Executed(entry));
                }
                Err(err) if err.is_fatal() => {
                    warn!(error = %err, "fatal platform error, aborting run");
                    let entry = self
                        .base_entry(request, false, attempt + 1)
                        .with_error(err.to_string());
                    self.change_log.append(entry).await?;
                    return Err(ExecutorError::Fatal(err));
                }
                Err(err) if err.is_retryable() && attempt < self.config.max_retries => {
                    let delay = self.config.retry_strategy.delay_for(attempt);
                    warn!(
                        attempt,
                        error = %err,
                        delay_ms = %delay.as_millis(),
                        "transient platform error, will retry"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    warn!(
                        attempt,
                        error = %err,
                        retryable = err.is_retryable(),
                        "action failed"
                    );
                    let entry = self
                        .base_entry(request, false, attempt + 1)
                        .with_error(err.to_string());
                    self.change_log.append(entry.clone()).await?;
                    return Ok(ExecutionOutcome::Failed(entry));
                }
            }
        }
    }

    /// Issue the platform call and return the resulting new value.
    async fn dispatch(&self, action: &PlatformAction) -> Result<ChangedValue, PlatformError> {
        match action {
            PlatformAction::Disable { banner_id, .. } => {
                self.client.set_enabled(*banner_id, false).await?;
                Ok(ChangedValue::Enabled(false))
            }
            PlatformAction::SetBudget {
                group_id,
                new_budget,
                ..
            } => {
                self.client.set_budget(*group_id, *new_budget).await?;
                Ok(ChangedValue::Budget(*new_budget))
            }
            PlatformAction::DuplicateGroup {
                group_id,
                copies,
                overrides,
            } => {
                let new_groups = self
                    .client
                    .duplicate_group(*group_id, *copies, overrides)
                    .await?;
                Ok(ChangedValue::Groups(new_groups))
            }
        }
    }

    fn base_entry(&self, request: &ActionRequest, success: bool, attempts: u32) -> ChangeLogEntry {
        ChangeLogEntry::new(
            request.run_id.clone(),
            request.rule_id.clone(),
            request.account_id,
            request.action.entity_id(),
            action_kind(&request.action),
            success,
            attempts,
            request.dry_run,
        )
    }
}

fn action_kind(action: &PlatformAction) -> ActionKind {
    match action {
        PlatformAction::Disable { .. } => ActionKind::Disable,
        PlatformAction::SetBudget { .. } => ActionKind::SetBudget,
        PlatformAction::DuplicateGroup { .. } => ActionKind::DuplicateGroup,
    }
}

/// The before/after values an action would record, without calling the
/// platform. Used for dry runs and for the `old_value` side of real calls.
fn planned_values(action: &PlatformAction) -> (Option<ChangedValue>, Option<ChangedValue>) {
    match action {
        PlatformAction::Disable { .. } => (
            Some(ChangedValue::Enabled(true)),
            Some(ChangedValue::Enabled(false)),
        ),
        PlatformAction::SetBudget {
            old_budget,
            new_budget,
            ..
        } => (
            Some(ChangedValue::Budget(*old_budget)),
            Some(ChangedValue::Budget(*new_budget)),
        ),
        // The created group ids are only known after the platform call.
        PlatformAction::DuplicateGroup { .. } => (None, None),
    }
}
