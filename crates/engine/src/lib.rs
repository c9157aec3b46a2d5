pub mod engine;
pub mod enrich;
pub mod error;
pub mod registry;
pub mod runs;
pub mod scheduler;
pub mod tracker;

pub use engine::{Engine, EngineBuilder, EngineConfig};
pub use enrich::RevenueIndex;
pub use error::EngineError;
pub use registry::{RuleLock, RunGuard, RunRegistry};
pub use scheduler::{QuietHours, Scheduler, SchedulerConfig};
pub use tracker::TaskTracker;
