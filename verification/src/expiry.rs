//! Expiry timer bookkeeping.
//!
//! Each live session owns one deferred expiry task. Aborting a task when its
//! session is superseded or closed saves work, but correctness rests on the
//! [`SessionToken`] check the task performs when it fires.

use biogate_types::{MemberId, Timestamp};
use std::collections::HashMap;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::session::SessionToken;

/// How long to wait before a session created at `created_at` expires.
/// Zero when the deadline has already passed (fire immediately).
pub fn delay_until_expiry(created_at: Timestamp, now: Timestamp, timeout: Duration) -> Duration {
    timeout.saturating_sub(created_at.elapsed_since(now))
}

#[derive(Debug, Default)]
pub struct ExpiryTimers {
    timers: HashMap<MemberId, (SessionToken, JoinHandle<()>)>,
}

impl ExpiryTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track the timer for a new session, aborting any timer it replaces.
    pub fn replace(&mut self, member: MemberId, token: SessionToken, handle: JoinHandle<()>) {
        if let Some((_, old)) = self.timers.insert(member, (token, handle)) {
            old.abort();
        }
    }

    /// Abort the member's timer, whatever session it belongs to.
    pub fn cancel(&mut self, member: &MemberId) -> bool {
        match self.timers.remove(member) {
            Some((_, handle)) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Drop bookkeeping for a timer that has fired, without aborting it.
    ///
    /// Called from inside the firing task, which must not abort itself.
    pub fn forget(&mut self, member: &MemberId, token: SessionToken) {
        if self
            .timers
            .get(member)
            .is_some_and(|(tracked, _)| *tracked == token)
        {
            self.timers.remove(member);
        }
    }

    pub fn is_scheduled(&self, member: &MemberId) -> bool {
        self.timers
            .get(member)
            .is_some_and(|(_, handle)| !handle.is_finished())
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}

impl Drop for ExpiryTimers {
    fn drop(&mut self) {
        for (_, (_, handle)) in self.timers.drain() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(generation: u64) -> SessionToken {
        SessionToken {
            created_at: Timestamp::EPOCH,
            generation,
        }
    }

    #[test]
    fn delay_counts_down_and_clamps_at_zero() {
        let created = Timestamp::from_secs(1000);
        let timeout = Duration::from_secs(600);
        assert_eq!(delay_until_expiry(created, created, timeout), timeout);
        assert_eq!(
            delay_until_expiry(created, Timestamp::from_secs(1100), timeout),
            Duration::from_secs(500)
        );
        assert_eq!(
            delay_until_expiry(created, Timestamp::from_secs(5000), timeout),
            Duration::ZERO
        );
    }

    #[tokio::test]
    async fn replace_aborts_previous_timer() {
        let mut timers = ExpiryTimers::new();
        let member = MemberId::new("a");
        let (alive_tx, alive_rx) = tokio::sync::oneshot::channel::<()>();
        let first = tokio::spawn(async move {
            let _alive = alive_tx;
            std::future::pending::<()>().await
        });
        timers.replace(member.clone(), token(1), first);
        timers.replace(member.clone(), token(2), tokio::spawn(std::future::pending::<()>()));

        // The sender is dropped only when the first task is torn down.
        assert!(alive_rx.await.is_err());
        assert!(timers.is_scheduled(&member));
        assert_eq!(timers.len(), 1);
    }

    #[tokio::test]
    async fn forget_only_matches_its_own_token() {
        let mut timers = ExpiryTimers::new();
        let member = MemberId::new("a");
        timers.replace(member.clone(), token(2), tokio::spawn(std::future::pending::<()>()));

        timers.forget(&member, token(1));
        assert_eq!(timers.len(), 1);
        timers.forget(&member, token(2));
        assert!(timers.is_empty());
    }

    #[tokio::test]
    async fn cancel_removes_timer() {
        let mut timers = ExpiryTimers::new();
        let member = MemberId::new("a");
        timers.replace(member.clone(), token(1), tokio::spawn(std::future::pending::<()>()));
        assert!(timers.cancel(&member));
        assert!(!timers.cancel(&member));
        assert!(!timers.is_scheduled(&member));
    }
}
