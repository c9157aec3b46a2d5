use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{debug, error, info};

use adpilot_core::{AccountId, BudgetRule, RuleId};

use crate::engine::Engine;
use crate::error::EngineError;

/// A daily window during which ticks are suppressed.
///
/// When `start > end` the window wraps over midnight (e.g. 23:00–06:00).
#[derive(Debug, Clone, Copy)]
pub struct QuietHours {
    /// Start of the window, local time.
    pub start: NaiveTime,
    /// End of the window, local time (exclusive).
    pub end: NaiveTime,
}

impl QuietHours {
    /// Whether the given local time falls inside the window.
    #[must_use]
    pub fn contains(&self, time: NaiveTime) -> bool {
        if self.start <= self.end {
            time >= self.start && time < self.end
        } else {
            time >= self.start || time < self.end
        }
    }
}

/// Configuration for the [`Scheduler`].
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Interval between analysis ticks.
    pub tick_interval: Duration,
    /// Upper bound on the one-off start delay, spreading engine instances
    /// that boot together.
    pub start_jitter: Duration,
    /// Optional daily suppression window.
    pub quiet_hours: Option<QuietHours>,
    /// Timezone for quiet hours and budget `schedule_time` evaluation.
    pub timezone: Tz,
    /// Accounts to analyze on each tick.
    pub accounts: Vec<AccountId>,
    /// Run everything in dry-run mode.
    pub dry_run: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(15 * 60),
            start_jitter: Duration::from_secs(30),
            quiet_hours: None,
            timezone: chrono_tz::UTC,
            accounts: Vec::new(),
            dry_run: false,
        }
    }
}

/// Issues analysis ticks and spawns rule runs.
///
/// Each tick spawns one disable analysis per account, plus one combined
/// budget run for the budget rules whose `schedule_time` fell due since the
/// previous tick. Runs are independent tokio tasks; the engine's
/// [`RunRegistry`](crate::RunRegistry) rejects a tick that would overlap an
/// active run of the same rule.
pub struct Scheduler {
    engine: Arc<Engine>,
    config: SchedulerConfig,
    shutdown_rx: mpsc::Receiver<()>,
}

impl Scheduler {
    /// Create a scheduler. Returns the scheduler and a shutdown sender.
    #[must_use]
    pub fn new(engine: Arc<Engine>, config: SchedulerConfig) -> (Self, mpsc::Sender<()>) {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        (
            Self {
                engine,
                config,
                shutdown_rx,
            },
            shutdown_tx,
        )
    }

    /// Run until shutdown is signaled.
    pub async fn run(&mut self) {
        info!("scheduler starting");

        if !self.config.start_jitter.is_zero() {
            let delay = jittered_delay(self.config.start_jitter);
            debug!(delay_ms = %delay.as_millis(), "applying start jitter");
            tokio::time::sleep(delay).await;
        }

        let mut ticker = interval(self.config.tick_interval);
        let mut last_tick = Utc::now();

        loop {
            tokio::select! {
                _ = self.shutdown_rx.recv() => {
                    info!("scheduler received shutdown signal");
                    break;
                }
                _ = ticker.tick() => {
                    let now = Utc::now();
                    self.on_tick(last_tick, now).await;
                    last_tick = now;
                }
            }
        }

        info!("scheduler stopped");
    }

    async fn on_tick(&self, last_tick: DateTime<Utc>, now: DateTime<Utc>) {
        let local = now.with_timezone(&self.config.timezone).time();
        if let Some(quiet) = self.config.quiet_hours
            && quiet.contains(local)
        {
            debug!(%local, "quiet hours, tick suppressed");
            return;
        }

        for &account_id in &self.config.accounts {
            self.spawn_disable_analysis(account_id);
            self.spawn_due_budget_rules(account_id, last_tick, now).await;
        }
    }

    fn spawn_disable_analysis(&self, account_id: AccountId) {
        let engine = Arc::clone(&self.engine);
        let dry_run = self.config.dry_run;
        tokio::spawn(async move {
            match engine.run_disable_analysis(account_id, dry_run).await {
                Ok(run) => {
                    debug!(run = %run.id, status = ?run.status, "disable analysis finished");
                }
                Err(EngineError::RunInProgress(rule)) => {
                    debug!(rule = %rule, "previous analysis still running, tick skipped");
                }
                Err(err) => {
                    error!(account = %account_id, error = %err, "disable analysis failed");
                }
            }
        });
    }

    async fn spawn_due_budget_rules(
        &self,
        account_id: AccountId,
        last_tick: DateTime<Utc>,
        now: DateTime<Utc>,
    ) {
        let rules = match self.engine.rules.budget_rules(account_id).await {
            Ok(rules) => rules,
            Err(err) => {
                error!(account = %account_id, error = %err, "loading budget rules failed");
                return;
            }
        };

        let due: Vec<RuleId> = rules
            .iter()
            .filter(|rule| {
                rule.rule.enabled && is_due(rule, self.config.timezone, last_tick, now)
            })
            .map(|rule| rule.rule.id.clone())
            .collect();
        if due.is_empty() {
            return;
        }

        let engine = Arc::clone(&self.engine);
        let dry_run = self.config.dry_run;
        tokio::spawn(async move {
            match engine.run_budget_rules(account_id, &due, dry_run).await {
                Ok(run) => debug!(run = %run.id, status = ?run.status, "budget run finished"),
                Err(EngineError::RunInProgress(rule)) => {
                    debug!(rule = %rule, "previous budget run still running, tick skipped");
                }
                Err(err) => error!(account = %account_id, error = %err, "budget run failed"),
            }
        });
    }
}

/// Compute the next time a budget rule's daily `schedule_time` fires after
/// the given instant, in the scheduler's timezone.
#[must_use]
pub fn next_fire(rule: &BudgetRule, tz: Tz, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let expr = format!(
        "{} {} * * *",
        rule.schedule_time.minute(),
        rule.schedule_time.hour()
    );
    let cron = croner::Cron::new(&expr).parse().ok()?;
    let after_tz = after.with_timezone(&tz);
    cron.find_next_occurrence(&after_tz, false)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Whether the rule's schedule fired inside the `(last_tick, now]` window.
fn is_due(rule: &BudgetRule, tz: Tz, last_tick: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    next_fire(rule, tz, last_tick).is_some_and(|fire| fire <= now)
}

/// Deterministic start delay derived from the clock's sub-second phase, so
/// no RNG is needed.
fn jittered_delay(max: Duration) -> Duration {
    let max_ms = u64::try_from(max.as_millis()).unwrap_or(u64::MAX);
    if max_ms == 0 {
        return Duration::ZERO;
    }
    let phase = u64::from(Utc::now().timestamp_subsec_millis());
    Duration::from_millis(phase % max_ms)
}
