use async_trait::async_trait;

use crate::error::AuditError;
use crate::record::{ChangeLogEntry, ChangeLogPage, ChangeLogQuery};

/// Trait for change-log storage backends.
///
/// The log is append-only: backends must never update or delete entries on
/// behalf of the engine. Implementations must be `Send + Sync`.
#[async_trait]
pub trait ChangeLogStore: Send + Sync {
    /// Persist one entry.
    async fn append(&self, entry: ChangeLogEntry) -> Result<(), AuditError>;

    /// Query entries with filters and pagination, newest first.
    async fn query(&self, query: &ChangeLogQuery) -> Result<ChangeLogPage, AuditError>;
}
