//! Per-asset serialization.
//!
//! Every ingestion for one asset id runs while holding that asset's lock, so
//! lookup-previous, detect and commit form a single critical section for the
//! asset. Different assets never contend.
//!
//! # Thread Safety
//!
//! Locks are created on demand and removed when the last holder releases
//! them. Removal happens under the map's shard lock and only when the map holds
//! the sole reference, so a task that has cloned the mutex but not yet
//! acquired it keeps the entry alive.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Keyed async mutexes, one per asset id currently being ingested.
#[derive(Debug, Default)]
pub struct AssetLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl AssetLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `asset_id`.
    pub async fn acquire(&self, asset_id: &str) -> AssetGuard<'_> {
        let mutex = self
            .locks
            .entry(asset_id.to_string())
            .or_default()
            .value()
            .clone();
        let guard = mutex.lock_owned().await;
        AssetGuard {
            locks: self,
            asset_id: asset_id.to_string(),
            guard: Some(guard),
        }
    }

    /// Number of asset ids with a live lock entry.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Exclusive access to one asset; released on drop.
#[derive(Debug)]
pub struct AssetGuard<'a> {
    locks: &'a AssetLocks,
    asset_id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl AssetGuard<'_> {
    pub fn asset_id(&self) -> &str {
        &self.asset_id
    }
}

impl Drop for AssetGuard<'_> {
    fn drop(&mut self) {
        // Release before pruning so the strong count reflects waiters only
        drop(self.guard.take());
        self.locks
            .locks
            .remove_if(&self.asset_id, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_entry_removed_after_release() {
        let locks = AssetLocks::new();
        {
            let guard = locks.acquire("X1").await;
            assert_eq!(guard.asset_id(), "X1");
            assert_eq!(locks.len(), 1);
        }
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_different_assets_do_not_block() {
        let locks = AssetLocks::new();
        let _a = locks.acquire("A").await;
        let b = tokio::time::timeout(Duration::from_millis(100), locks.acquire("B")).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn test_same_asset_is_exclusive() {
        let locks = Arc::new(AssetLocks::new());
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let active = Arc::clone(&active);
                let peak = Arc::clone(&peak);
                tokio::spawn(async move {
                    let _guard = locks.acquire("SAME").await;
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(2)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();

        for task in futures::future::join_all(tasks).await {
            task.unwrap();
        }
        assert_eq!(peak.load(Ordering::SeqCst), 1);
        assert!(locks.is_empty());
    }
}
