//! Per-user async locks serializing award checks.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use streetcred_core::UserId;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Idle entries are pruned once the table grows past this size.
const PRUNE_THRESHOLD: usize = 256;

/// A table of per-user async mutexes, created on demand.
///
/// The outer map lock is `parking_lot` and never held across `.await`.
#[derive(Debug, Default)]
pub struct UserLocks {
    table: Mutex<HashMap<UserId, Arc<AsyncMutex<()>>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `user_id`'s awards.
    pub async fn acquire(&self, user_id: &UserId) -> OwnedMutexGuard<()> {
        let entry = {
            let mut table = self.table.lock();
            if table.len() >= PRUNE_THRESHOLD {
                // Only the table holds a reference: nobody owns or awaits it.
                table.retain(|_, m| Arc::strong_count(m) > 1);
            }
            Arc::clone(table.entry(user_id.clone()).or_default())
        };
        entry.lock_owned().await
    }

    /// Number of tracked users.
    pub fn len(&self) -> usize {
        self.table.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
