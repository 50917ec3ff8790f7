//! Per-key async locks shared by the attempt stores.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::trace;

type Key = (String, usize);

/// Table size at which idle entries are dropped.
const PRUNE_AT: usize = 1024;

/// Table of one async mutex per `(student_id, exercise)`.
///
/// Entries are created on first use. Once the table reaches `PRUNE_AT` entries, every
/// entry that nobody holds or waits for is dropped before a new one is added.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    table: Mutex<HashMap<Key, Arc<AsyncMutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, student_id: &str, exercise: usize) -> Arc<AsyncMutex<()>> {
        // The table only holds Arcs, so a poisoned guard is still consistent.
        let mut table = self.table.lock().unwrap_or_else(|e| e.into_inner());
        if table.len() >= PRUNE_AT {
            // Guards and waiters hold their own clone of the Arc.
            table.retain(|_, mutex| Arc::strong_count(mutex) > 1);
        }
        table
            .entry((student_id.to_string(), exercise))
            .or_default()
            .clone()
    }

    /// Waits until the key is free and returns a guard that releases it on drop.
    pub async fn acquire(&self, student_id: &str, exercise: usize) -> AttemptLock {
        let mutex = self.entry(student_id, exercise);
        let guard = mutex.lock_owned().await;
        trace!(student_id, exercise, "Acquired attempt lock");
        AttemptLock { _guard: guard }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.table.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// Exclusive access to one `(student_id, exercise)` key until dropped.
#[derive(Debug)]
pub struct AttemptLock {
    _guard: OwnedMutexGuard<()>,
}
