pub mod rules;
pub mod tasks;
pub mod whitelist;

pub use rules::MemoryRuleStore;
pub use tasks::MemoryTaskStore;
pub use whitelist::MemoryWhitelistStore;
