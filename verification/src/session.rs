//! Session store: the single source of truth for "is this member mid-verification".
//!
//! At most one live session exists per member. Creating a session for a member
//! replaces (and returns) any previous one; the caller is responsible for
//! cancelling the replaced session's expiry timer.

use biogate_types::{MemberId, Timestamp, VerificationCode};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

/// Identity of one particular session instance.
///
/// Timers and in-flight submissions carry a token and compare it against the
/// store before acting, so a superseded session can never be touched by work
/// that was started on its behalf.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct SessionToken {
    pub created_at: Timestamp,
    pub generation: u64,
}

/// One member's in-flight verification attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VerificationSession {
    pub member: MemberId,
    pub code: VerificationCode,
    pub created_at: Timestamp,
    /// Code submissions made so far. Never decreases.
    pub attempts: u32,
    generation: u64,
}

impl VerificationSession {
    pub fn token(&self) -> SessionToken {
        SessionToken {
            created_at: self.created_at,
            generation: self.generation,
        }
    }

    pub fn expires_at(&self, timeout: Duration) -> Timestamp {
        self.created_at.plus(timeout)
    }

    /// Strictly past the deadline: a submission landing exactly on it still counts.
    pub fn is_expired(&self, now: Timestamp, timeout: Duration) -> bool {
        self.created_at.elapsed_since(now) > timeout
    }
}

#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<MemberId, VerificationSession>,
    next_generation: u64,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a fresh session. Returns the new session and the one it replaced, if any.
    pub fn create(
        &mut self,
        member: MemberId,
        code: VerificationCode,
        now: Timestamp,
    ) -> (VerificationSession, Option<VerificationSession>) {
        self.next_generation += 1;
        let session = VerificationSession {
            member: member.clone(),
            code,
            created_at: now,
            attempts: 0,
            generation: self.next_generation,
        };
        let replaced = self.sessions.insert(member, session.clone());
        (session, replaced)
    }

    pub fn get(&self, member: &MemberId) -> Option<&VerificationSession> {
        self.sessions.get(member)
    }

    pub fn get_mut(&mut self, member: &MemberId) -> Option<&mut VerificationSession> {
        self.sessions.get_mut(member)
    }

    pub fn delete(&mut self, member: &MemberId) -> Option<VerificationSession> {
        self.sessions.remove(member)
    }

    /// Whether the live session for `member` is exactly the one `token` names.
    pub fn is_current(&self, member: &MemberId, token: SessionToken) -> bool {
        self.sessions
            .get(member)
            .is_some_and(|s| s.token() == token)
    }

    /// Delete the session only if it is still the one `token` names.
    pub fn delete_if_current(
        &mut self,
        member: &MemberId,
        token: SessionToken,
    ) -> Option<VerificationSession> {
        if self.is_current(member, token) {
            self.sessions.remove(member)
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(id: &str) -> MemberId {
        MemberId::new(id)
    }

    #[test]
    fn create_replaces_previous_session() {
        let mut store = SessionStore::new();
        let (first, replaced) =
            store.create(member("a"), VerificationCode::new("AAAA0000"), Timestamp::from_secs(1));
        assert!(replaced.is_none());

        let (second, replaced) =
            store.create(member("a"), VerificationCode::new("BBBB1111"), Timestamp::from_secs(1));
        assert_eq!(replaced.unwrap(), first);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&member("a")).unwrap(), &second);
    }

    #[test]
    fn tokens_differ_even_with_identical_creation_time() {
        let mut store = SessionStore::new();
        let now = Timestamp::from_secs(5);
        let (first, _) = store.create(member("a"), VerificationCode::new("AAAA0000"), now);
        let (second, _) = store.create(member("a"), VerificationCode::new("BBBB1111"), now);
        assert_ne!(first.token(), second.token());
        assert!(!store.is_current(&member("a"), first.token()));
        assert!(store.is_current(&member("a"), second.token()));
    }

    #[test]
    fn delete_if_current_ignores_stale_tokens() {
        let mut store = SessionStore::new();
        let now = Timestamp::from_secs(5);
        let (stale, _) = store.create(member("a"), VerificationCode::new("AAAA0000"), now);
        let (live, _) = store.create(member("a"), VerificationCode::new("BBBB1111"), now);

        assert!(store.delete_if_current(&member("a"), stale.token()).is_none());
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.delete_if_current(&member("a"), live.token()).unwrap(),
            live
        );
        assert!(store.is_empty());
    }

    #[test]
    fn expiry_is_strictly_after_timeout() {
        let mut store = SessionStore::new();
        let (s, _) =
            store.create(member("a"), VerificationCode::new("AAAA0000"), Timestamp::from_secs(100));
        let timeout = Duration::from_secs(600);
        assert!(!s.is_expired(Timestamp::from_secs(700), timeout));
        assert!(s.is_expired(Timestamp::from_millis(700_001), timeout));
        assert_eq!(s.expires_at(timeout), Timestamp::from_secs(700));
    }
}
