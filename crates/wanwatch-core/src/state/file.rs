// # File State Store
//
// File-based implementation of StateStore.
//
// ## File Format
//
// One address per line, trailing newline, no ordering guarantees:
//
// ```text
// 203.0.113.5
// 2001:db8::1
// ```
//
// ## Durability
//
// - Atomic writes: new state goes to a temporary file in the same
//   directory, then renames over the record
// - A missing file is the valid initial state (empty set)
// - Any read failure is logged and treated as a missing file; the load
//   path cannot fail

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::StoreError;
use crate::traits::address_source::AddressSet;
use crate::traits::state_store::StateStore;

/// File-based state store with atomic full-file overwrites
///
/// # Example
///
/// ```rust,no_run
/// use wanwatch_core::state::FileStateStore;
/// use wanwatch_core::traits::StateStore;
/// use wanwatch_core::AddressSet;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileStateStore::new("/var/lib/wanwatch/addresses.txt").await?;
///
///     let set: AddressSet = ["203.0.113.5"].into_iter().collect();
///     store.save(&set).await?;
///     assert_eq!(store.load().await, set);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    /// Create a store for the given path, creating parent directories if
    /// needed
    ///
    /// The file itself is not created until the first save; its absence is
    /// the valid "never notified" initial state.
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(StoreError::from_io)?;
            }
        }

        Ok(Self { path })
    }

    /// Path of the durable record
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the temporary file used for atomic writes
    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn load(&self) -> AddressSet {
        match fs::read_to_string(&self.path).await {
            Ok(content) => {
                let set = AddressSet::from_lines(&content);
                tracing::trace!(
                    "Loaded {} address(es) from {}",
                    set.len(),
                    self.path.display()
                );
                set
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(
                    "State file {} does not exist, starting from empty set",
                    self.path.display()
                );
                AddressSet::new()
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to read state file {}: {}. Treating as empty.",
                    self.path.display(),
                    e
                );
                AddressSet::new()
            }
        }
    }

    async fn save(&self, addresses: &AddressSet) -> Result<(), StoreError> {
        let temp_path = self.temp_path();

        {
            let mut file = fs::File::create(&temp_path)
                .await
                .map_err(StoreError::from_io)?;
            file.write_all(addresses.to_lines().as_bytes())
                .await
                .map_err(StoreError::from_io)?;
            file.flush().await.map_err(StoreError::from_io)?;
        }

        fs::rename(&temp_path, &self.path)
            .await
            .map_err(StoreError::from_io)?;

        tracing::trace!(
            "State written to {} ({} address(es))",
            self.path.display(),
            addresses.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn missing_file_loads_as_empty() {
        let dir = tempdir().unwrap();
        let store = FileStateStore::new(dir.path().join("addresses.txt"))
            .await
            .unwrap();

        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("addresses.txt");
        let store = FileStateStore::new(&path).await.unwrap();

        let set: AddressSet = ["203.0.113.5", "2001:db8::1"].into_iter().collect();
        store.save(&set).await.unwrap();

        assert_eq!(store.load().await, set);

        // A fresh instance sees the persisted state
        let store2 = FileStateStore::new(&path).await.unwrap();
        assert_eq!(store2.load().await, set);
    }

    #[tokio::test]
    async fn save_overwrites_whole_record() {
        let dir = tempdir().unwrap();
        let store = FileStateStore::new(dir.path().join("addresses.txt"))
            .await
            .unwrap();

        let first: AddressSet = ["198.51.100.9"].into_iter().collect();
        store.save(&first).await.unwrap();

        let second: AddressSet = ["203.0.113.5"].into_iter().collect();
        store.save(&second).await.unwrap();

        let loaded = store.load().await;
        assert_eq!(loaded, second);
        assert!(!loaded.contains("198.51.100.9"));
    }

    #[tokio::test]
    async fn save_leaves_no_temp_file_behind() {
        let dir = tempdir().unwrap();
        let store = FileStateStore::new(dir.path().join("addresses.txt"))
            .await
            .unwrap();

        let set: AddressSet = ["203.0.113.5"].into_iter().collect();
        store.save(&set).await.unwrap();

        assert!(store.path().exists());
        assert!(!store.temp_path().exists());
    }

    #[tokio::test]
    async fn unreadable_path_loads_as_empty() {
        // A directory at the state path makes read_to_string fail with
        // something other than NotFound; load must still return empty.
        let dir = tempdir().unwrap();
        let store = FileStateStore::new(dir.path()).await.unwrap();

        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn creates_parent_directories() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b").join("addresses.txt");
        let store = FileStateStore::new(&nested).await.unwrap();

        let set: AddressSet = ["203.0.113.5"].into_iter().collect();
        store.save(&set).await.unwrap();
        assert_eq!(store.load().await, set);
    }
}
