use biogate_types::MemberId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-member mutual exclusion.
/// Events for different members proceed concurrently.
/// Events for the same member (including expiry timers) are serialized,
/// even across the awaited profile fetch.
#[derive(Default)]
pub struct MemberLocks {
    locks: Mutex<HashMap<MemberId, Arc<Mutex<()>>>>,
}

impl MemberLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the lock for a specific member.
    async fn member_lock(&self, member: &MemberId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(member.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Wait for exclusive access to `member`'s state.
    pub async fn lock(&self, member: &MemberId) -> OwnedMutexGuard<()> {
        self.member_lock(member).await.lock_owned().await
    }

    /// Number of members with a lock entry.
    pub async fn tracked(&self) -> usize {
        self.locks.lock().await.len()
    }

    /// Drop lock entries nobody holds or waits on.
    pub async fn cleanup(&self) {
        let mut locks = self.locks.lock().await;
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }
}
