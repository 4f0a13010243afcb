// # Memory State Store
//
// In-memory implementation of StateStore.
//
// All state is lost on restart, so the first cycle after a restart treats
// the current address set as a change from empty and re-notifies. Useful
// for tests and for deployments where a duplicate mail after a restart is
// acceptable.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::traits::address_source::AddressSet;
use crate::traits::state_store::StateStore;

/// In-memory state store implementation
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    inner: Arc<RwLock<AddressSet>>,
}

impl MemoryStateStore {
    /// Create a new empty memory state store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with the given set
    pub fn with_state(addresses: AddressSet) -> Self {
        Self {
            inner: Arc::new(RwLock::new(addresses)),
        }
    }

    /// Current contents, for assertions in tests
    pub async fn snapshot(&self) -> AddressSet {
        self.inner.read().await.clone()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn load(&self) -> AddressSet {
        self.inner.read().await.clone()
    }

    async fn save(&self, addresses: &AddressSet) -> Result<(), StoreError> {
        *self.inner.write().await = addresses.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn starts_empty() {
        let store = MemoryStateStore::new();
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn save_replaces_state() {
        let store = MemoryStateStore::new();

        let first: AddressSet = ["198.51.100.9"].into_iter().collect();
        store.save(&first).await.unwrap();

        let second: AddressSet = ["203.0.113.5", "2001:db8::1"].into_iter().collect();
        store.save(&second).await.unwrap();

        assert_eq!(store.load().await, second);
    }

    #[tokio::test]
    async fn clones_share_state() {
        let store = MemoryStateStore::new();
        let alias = store.clone();

        let set: AddressSet = ["203.0.113.5"].into_iter().collect();
        store.save(&set).await.unwrap();

        assert_eq!(alias.load().await, set);
    }
}
