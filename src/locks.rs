//! Per-folder write serialization.
//!
//! Full scans and watcher workers both take the lock of the folder they are
//! about to modify, so at most one writer touches a folder's catalog at a
//! time. Different folders never contend.

use std::sync::Arc;

use dashmap::DashMap;
use homestream_common::FolderId;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Clone, Default)]
pub struct FolderLocks {
    folders: Arc<DashMap<FolderId, Arc<Mutex<()>>>>,
}

impl FolderLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `folder`'s catalog.
    pub async fn lock(&self, folder: FolderId) -> OwnedMutexGuard<()> {
        let entry = self
            .folders
            .entry(folder)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        entry.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_folder_is_exclusive() {
        let locks = FolderLocks::new();
        let guard = locks.lock(FolderId::from(1)).await;

        let contender = locks.clone();
        let waiting = tokio::spawn(async move {
            let _guard = contender.lock(FolderId::from(1)).await;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiting.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiting)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn different_folders_do_not_contend() {
        let locks = FolderLocks::new();
        let _one = locks.lock(FolderId::from(1)).await;
        let two =
            tokio::time::timeout(Duration::from_millis(100), locks.lock(FolderId::from(2))).await;
        assert!(two.is_ok());
    }
}
