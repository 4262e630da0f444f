use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Per-context advisory locks. Work on one context is serialized while
/// different contexts proceed in parallel.
#[derive(Default)]
pub struct ContextLocks {
    locks: Mutex<HashMap<i64, Arc<AsyncMutex<()>>>>,
}

impl ContextLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, context_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            // Forget locks nobody is holding or waiting on.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks
                .entry(context_id)
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}
