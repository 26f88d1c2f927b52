pub mod goals;
pub mod reading;
pub mod recap;
pub mod startup;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per user. Goal synchronization is a read-then-write over
/// the user's goals, so every mutating library/goal operation takes the
/// owner's lock before opening its transaction; two concurrent requests for
/// the same user serialize instead of racing on goal amounts.
///
/// Entries are never pruned; the footprint is one mutex per user seen.
#[derive(Clone, Default)]
pub struct UserLocks {
    locks: Arc<Mutex<HashMap<i64, Arc<Mutex<()>>>>>,
}

impl UserLocks {
    pub async fn lock_user(&self, user_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.locks.lock().await;
            map.entry(user_id).or_default().clone()
        };
        lock.lock_owned().await
    }
}
