use std::sync::Arc;

use adpilot_audit::ChangeLogStore;
use adpilot_core::{AccountId, RuleId};
use adpilot_executor::{ActionExecutor, ExecutorConfig};
use adpilot_platform::{AdPlatformClient, AttributionProvider, MetricsProvider};
use adpilot_store::{RuleStore, TaskStore, WhitelistStore};

use crate::registry::RunRegistry;

/// Engine-level configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Lookback window for the shared disable analysis, in days.
    /// Budget rules carry their own per-rule lookback instead.
    pub disable_lookback_days: u32,
    /// Lookback window for scaling classification, in days.
    pub scaling_lookback_days: u32,
    /// Executor retry and concurrency settings.
    pub executor: ExecutorConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            disable_lookback_days: 7,
            scaling_lookback_days: 7,
            executor: ExecutorConfig::default(),
        }
    }
}

/// The rule evaluation and action engine.
///
/// Owns no transport and no storage: every external concern is reached
/// through a collaborator trait. One engine serves all accounts; runs for
/// different rules may execute concurrently while the [`RunRegistry`]
/// serializes runs per rule id.
pub struct Engine {
    pub(crate) metrics: Arc<dyn MetricsProvider>,
    pub(crate) attribution: Arc<dyn AttributionProvider>,
    pub(crate) rules: Arc<dyn RuleStore>,
    pub(crate) whitelist: Arc<dyn WhitelistStore>,
    pub(crate) tasks: Arc<dyn TaskStore>,
    pub(crate) executor: ActionExecutor,
    pub(crate) registry: Arc<RunRegistry>,
    pub(crate) config: EngineConfig,
}

impl Engine {
    /// Start building an engine.
    #[must_use]
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// The run registry, for cancellation and introspection.
    #[must_use]
    pub fn registry(&self) -> &Arc<RunRegistry> {
        &self.registry
    }

    /// Synthetic rule id under which an account's shared disable analysis
    /// is serialized and tracked.
    pub(crate) fn disable_analysis_id(account_id: AccountId) -> RuleId {
        RuleId::new(format!("disable-analysis:{account_id}"))
    }

    /// Synthetic rule id for an account's combined budget run.
    pub(crate) fn budget_run_id(account_id: AccountId) -> RuleId {
        RuleId::new(format!("budget-run:{account_id}"))
    }
}

/// Builder for [`Engine`].
#[derive(Default)]
pub struct EngineBuilder {
    metrics: Option<Arc<dyn MetricsProvider>>,
    attribution: Option<Arc<dyn AttributionProvider>>,
    platform: Option<Arc<dyn AdPlatformClient>>,
    rules: Option<Arc<dyn RuleStore>>,
    whitelist: Option<Arc<dyn WhitelistStore>>,
    tasks: Option<Arc<dyn TaskStore>>,
    change_log: Option<Arc<dyn ChangeLogStore>>,
    config: EngineConfig,
}

impl EngineBuilder {
    /// Create a builder with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the metrics provider.
    #[must_use]
    pub fn metrics(mut self, metrics: Arc<dyn MetricsProvider>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Set the attribution provider.
    #[must_use]
    pub fn attribution(mut self, attribution: Arc<dyn AttributionProvider>) -> Self {
        self.attribution = Some(attribution);
        self
    }

    /// Set the mutating ad-platform client.
    #[must_use]
    pub fn platform(mut self, platform: Arc<dyn AdPlatformClient>) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Set the rule store.
    #[must_use]
    pub fn rules(mut self, rules: Arc<dyn RuleStore>) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Set the whitelist store.
    #[must_use]
    pub fn whitelist(mut self, whitelist: Arc<dyn WhitelistStore>) -> Self {
        self.whitelist = Some(whitelist);
        self
    }

    /// Set the task store.
    #[must_use]
    pub fn tasks(mut self, tasks: Arc<dyn TaskStore>) -> Self {
        self.tasks = Some(tasks);
        self
    }

    /// Set the change-log store.
    #[must_use]
    pub fn change_log(mut self, change_log: Arc<dyn ChangeLogStore>) -> Self {
        self.change_log = Some(change_log);
        self
    }

    /// Set the engine configuration.
    #[must_use]
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the engine.
    pub fn build(self) -> Result<Engine, &'static str> {
        let metrics = self.metrics.ok_or("metrics provider is required")?;
        let attribution = self.attribution.ok_or("attribution provider is required")?;
        let platform = self.platform.ok_or("platform client is required")?;
        let rules = self.rules.ok_or("rule store is required")?;
        let whitelist = self.whitelist.ok_or("whitelist store is required")?;
        let tasks = self.tasks.ok_or("task store is required")?;
        let change_log = self.change_log.ok_or("change-log store is required")?;

        let executor = ActionExecutor::new(
            platform,
            Arc::clone(&whitelist),
            change_log,
            self.config.executor.clone(),
        );

        Ok(Engine {
            metrics,
            attribution,
            rules,
            whitelist,
            tasks,
            executor,
            registry: Arc::new(RunRegistry::new()),
            config: self.config,
        })
    }
}
