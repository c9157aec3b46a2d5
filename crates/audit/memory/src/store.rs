use async_trait::async_trait;
use tokio::sync::RwLock;

use adpilot_audit::{AuditError, ChangeLogEntry, ChangeLogPage, ChangeLogQuery, ChangeLogStore};

/// In-memory [`ChangeLogStore`] backed by an append-only vector.
///
/// Intended for tests and local development; queries scan the whole log.
#[derive(Debug, Default)]
pub struct MemoryChangeLogStore {
    entries: RwLock<Vec<ChangeLogEntry>>,
}

impl MemoryChangeLogStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries appended so far.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether no entries have been appended.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl ChangeLogStore for MemoryChangeLogStore {
    async fn append(&self, entry: ChangeLogEntry) -> Result<(), AuditError> {
        self.entries.write().await.push(entry);
        Ok(())
    }

    async fn query(&self, query: &ChangeLogQuery) -> Result<ChangeLogPage, AuditError> {
        let entries = self.entries.read().await;
        let mut matching: Vec<&ChangeLogEntry> =
            entries.iter().filter(|e| query.matches(e)).collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as u64;
        let limit = query.effective_limit();
        let offset = query.effective_offset();
        let page = matching
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect();

        Ok(ChangeLogPage {
            entries: page,
            total,
            limit,
            offset,
        })
    }
}
