//! Nullable platform: an in-memory community that records everything the
//! engine asks of it.

use async_trait::async_trait;
use biogate_platform::{Notice, NotifyResult, Platform, PlatformError, ReviewPost};
use biogate_types::{MemberId, MemberInfo};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A marker change the engine requested.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MarkerCall {
    Added(MemberId),
    Removed(MemberId),
}

/// A test platform backed by a member map.
///
/// Marker calls update the stored [`MemberInfo`], so a later
/// [`Platform::member`] lookup sees the change.
#[derive(Default)]
pub struct NullPlatform {
    members: Mutex<HashMap<MemberId, MemberInfo>>,
    notices: Mutex<Vec<(MemberId, Notice)>>,
    marker_calls: Mutex<Vec<MarkerCall>>,
    review_posts: Mutex<Vec<ReviewPost>>,
    /// Members whose direct notices bounce.
    unreachable: Mutex<HashSet<MemberId>>,
    fail_marker_changes: AtomicBool,
    fail_review_posts: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl NullPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a member.
    pub fn set_member(&self, info: MemberInfo) {
        lock(&self.members).insert(info.id.clone(), info);
    }

    /// Simulate the member leaving.
    pub fn remove_member(&self, member: &MemberId) -> Option<MemberInfo> {
        lock(&self.members).remove(member)
    }

    pub fn has_marker(&self, member: &MemberId) -> Option<bool> {
        lock(&self.members)
            .get(member)
            .map(|info| info.has_unverified_marker)
    }

    /// Make every direct notice to `member` fail.
    pub fn block_notices(&self, member: &MemberId) {
        lock(&self.unreachable).insert(member.clone());
    }

    pub fn unblock_notices(&self, member: &MemberId) {
        lock(&self.unreachable).remove(member);
    }

    /// Make marker add/remove fail with `Forbidden`.
    pub fn fail_marker_changes(&self, fail: bool) {
        self.fail_marker_changes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_review_posts(&self, fail: bool) {
        self.fail_review_posts.store(fail, Ordering::SeqCst);
    }

    /// All notices delivered so far (for assertions).
    pub fn notices(&self) -> Vec<(MemberId, Notice)> {
        lock(&self.notices).clone()
    }

    /// Notices delivered to one member, in order.
    pub fn notices_for(&self, member: &MemberId) -> Vec<Notice> {
        lock(&self.notices)
            .iter()
            .filter(|(to, _)| to == member)
            .map(|(_, notice)| notice.clone())
            .collect()
    }

    pub fn marker_calls(&self) -> Vec<MarkerCall> {
        lock(&self.marker_calls).clone()
    }

    pub fn review_posts(&self) -> Vec<ReviewPost> {
        lock(&self.review_posts).clone()
    }

    /// Clear recorded calls. Members are kept.
    pub fn reset(&self) {
        lock(&self.notices).clear();
        lock(&self.marker_calls).clear();
        lock(&self.review_posts).clear();
    }

    fn set_marker(&self, member: &MemberId, marked: bool) -> Result<(), PlatformError> {
        if self.fail_marker_changes.load(Ordering::SeqCst) {
            return Err(PlatformError::Forbidden("manage roles".into()));
        }
        let mut members = lock(&self.members);
        let info = members
            .get_mut(member)
            .ok_or_else(|| PlatformError::MemberNotFound(member.to_string()))?;
        info.has_unverified_marker = marked;
        let call = if marked {
            MarkerCall::Added(member.clone())
        } else {
            MarkerCall::Removed(member.clone())
        };
        lock(&self.marker_calls).push(call);
        Ok(())
    }
}

#[async_trait]
impl Platform for NullPlatform {
    async fn member(&self, member: &MemberId) -> Option<MemberInfo> {
        lock(&self.members).get(member).cloned()
    }

    async fn add_unverified_marker(&self, member: &MemberId) -> Result<(), PlatformError> {
        self.set_marker(member, true)
    }

    async fn remove_unverified_marker(&self, member: &MemberId) -> Result<(), PlatformError> {
        self.set_marker(member, false)
    }

    async fn notify(&self, member: &MemberId, notice: Notice) -> NotifyResult {
        if lock(&self.unreachable).contains(member) {
            return NotifyResult::Failed(PlatformError::Request(format!(
                "cannot send messages to {member}"
            )));
        }
        lock(&self.notices).push((member.clone(), notice));
        NotifyResult::Delivered
    }

    async fn post_review(&self, post: ReviewPost) -> NotifyResult {
        if self.fail_review_posts.load(Ordering::SeqCst) {
            return NotifyResult::Failed(PlatformError::Request("review channel missing".into()));
        }
        lock(&self.review_posts).push(post);
        NotifyResult::Delivered
    }
}
