pub mod error;
pub mod record;
pub mod store;

pub use error::AuditError;
pub use record::{ActionKind, ChangeLogEntry, ChangeLogPage, ChangeLogQuery, ChangedValue};
pub use store::ChangeLogStore;
