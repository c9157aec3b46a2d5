use async_trait::async_trait;
use dashmap::DashSet;

use adpilot_core::BannerId;
use adpilot_store::{StoreError, WhitelistStore};

/// In-memory [`WhitelistStore`] backed by a [`DashSet`].
#[derive(Debug, Default)]
pub struct MemoryWhitelistStore {
    banners: DashSet<BannerId>,
}

impl MemoryWhitelistStore {
    /// Create an empty whitelist.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a whitelist pre-populated with the given banners.
    #[must_use]
    pub fn with_banners(banners: impl IntoIterator<Item = BannerId>) -> Self {
        let store = Self::new();
        for banner in banners {
            store.banners.insert(banner);
        }
        store
    }
}

#[async_trait]
impl WhitelistStore for MemoryWhitelistStore {
    async fn contains(&self, banner_id: BannerId) -> Result<bool, StoreError> {
        Ok(self.banners.contains(&banner_id))
    }

    async fn add(&self, banner_id: BannerId) -> Result<(), StoreError> {
        self.banners.insert(banner_id);
        Ok(())
    }

    async fn remove(&self, banner_id: BannerId) -> Result<bool, StoreError> {
        Ok(self.banners.remove(&banner_id).is_some())
    }

    async fn list(&self) -> Result<Vec<BannerId>, StoreError> {
        let mut ids: Vec<BannerId> = self.banners.iter().map(|entry| *entry).collect();
        ids.sort_unstable();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn add_contains_remove() {
        let store = MemoryWhitelistStore::new();
        let banner = BannerId::new(5);

        assert!(!store.contains(banner).await.unwrap());
        store.add(banner).await.unwrap();
        assert!(store.contains(banner).await.unwrap());

        assert!(store.remove(banner).await.unwrap());
        assert!(!store.contains(banner).await.unwrap());
        assert!(!store.remove(banner).await.unwrap());
    }

    #[tokio::test]
    async fn list_is_sorted() {
        let store =
            MemoryWhitelistStore::with_banners([BannerId::new(3), BannerId::new(1), BannerId::new(2)]);
        let ids = store.list().await.unwrap();
        assert_eq!(ids, vec![BannerId::new(1), BannerId::new(2), BannerId::new(3)]);
    }
}
