//! Per-dataset serialization of mutations
//!
//! Mutations on the same dataset id run one at a time; mutations on
//! different datasets do not contend. Without this two concurrent updates
//! could both read a stale dataset and send conflicting engine requests.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Keyed async mutex over dataset ids
#[derive(Debug, Clone, Default)]
pub struct DatasetLocks {
    locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl DatasetLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `dataset_id`, held until the guard drops
    pub async fn acquire(&self, dataset_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            // Entries nobody holds or waits on are only referenced by the map
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks
                .entry(dataset_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Number of ids currently tracked
    pub async fn tracked(&self) -> usize {
        self.locks.lock().await.len()
    }
}
