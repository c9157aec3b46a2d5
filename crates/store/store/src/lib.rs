pub mod error;
pub mod rules;
pub mod tasks;
pub mod whitelist;

pub use error::StoreError;
pub use rules::RuleStore;
pub use tasks::TaskStore;
pub use whitelist::WhitelistStore;
