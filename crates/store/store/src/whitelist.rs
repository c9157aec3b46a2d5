use async_trait::async_trait;

use adpilot_core::BannerId;

use crate::error::StoreError;

/// The protected set of banners exempt from automatic disabling.
///
/// Consulted twice per disable: once when snapshots are filtered before
/// rule evaluation, and again by the executor immediately before the
/// platform call, to defend against concurrent whitelist edits.
#[async_trait]
pub trait WhitelistStore: Send + Sync {
    /// Whether the banner is protected.
    async fn contains(&self, banner_id: BannerId) -> Result<bool, StoreError>;

    /// Protect a banner. Idempotent.
    async fn add(&self, banner_id: BannerId) -> Result<(), StoreError>;

    /// Remove protection. Returns `true` if the banner was protected.
    async fn remove(&self, banner_id: BannerId) -> Result<bool, StoreError>;

    /// All protected banner ids, ascending.
    async fn list(&self) -> Result<Vec<BannerId>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn _assert_dyn(_: &dyn WhitelistStore) {}
}
