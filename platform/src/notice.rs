//! Structured notifications. The engine decides *what* to tell a member;
//! the platform decides how it reads.

use biogate_types::{MemberId, ReviewId, Timestamp, VerificationCode};
use serde::{Deserialize, Serialize};

use crate::error::PlatformError;

/// Something the engine wants a member to know.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "notice", rename_all = "snake_case")]
pub enum Notice {
    /// A session was opened: put `code` in your bio before `expires_at`.
    SessionStarted {
        code: VerificationCode,
        expires_at: Timestamp,
    },
    /// Session start refused because of a punitive lockout.
    CooldownActive { remaining_secs: u64 },
    /// The session timed out before a valid submission arrived.
    SessionExpired,
    /// The case was handed to moderators.
    ReviewPending { review_id: ReviewId },
    /// Access granted, either automatically or by a moderator.
    Approved { by_moderator: bool },
    /// A moderator denied the case.
    Denied { review_id: ReviewId, reason: String },
}

/// A review case as shown to moderators.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewPost {
    pub review_id: ReviewId,
    pub member: MemberId,
    pub member_name: String,
    pub external_username: String,
    pub profile_url: String,
    pub flag_reason: String,
    pub code: VerificationCode,
    pub code_found_in_bio: bool,
    pub platform_age_days: u64,
    pub external_age_days: u64,
    pub external_level: u32,
}

/// Outcome of a best-effort delivery. Callers may log a failure but must not
/// undo the state transition that preceded it.
#[derive(Clone, Debug, PartialEq, Eq)]
#[must_use]
pub enum NotifyResult {
    Delivered,
    Failed(PlatformError),
}

impl NotifyResult {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

impl From<Result<(), PlatformError>> for NotifyResult {
    fn from(r: Result<(), PlatformError>) -> Self {
        match r {
            Ok(()) => Self::Delivered,
            Err(e) => Self::Failed(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notify_result_from_result() {
        assert!(NotifyResult::from(Ok(())).is_delivered());
        let failed = NotifyResult::from(Err(PlatformError::Forbidden("dm".into())));
        assert!(!failed.is_delivered());
    }
}
