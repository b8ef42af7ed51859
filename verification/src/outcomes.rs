//! Structured results for every engine operation.
//!
//! The presentation layer renders these; the engine never writes prose for
//! members itself.

use biogate_types::{MemberId, ReviewId, Timestamp, VerificationCode};
use serde::Serialize;

use crate::state::SessionPhase;

/// Result of asking to start a session (join, explicit command).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StartOutcome {
    Started {
        code: VerificationCode,
        expires_at: Timestamp,
    },
    /// The member has no unverified marker.
    AlreadyVerified,
    /// Another start happened too recently.
    RateLimited { remaining_secs: u64 },
    /// A punitive cooldown is running; `remaining` reads like `"1h 59m"`.
    InCooldown {
        until: Timestamp,
        remaining_secs: u64,
        remaining: String,
    },
    /// The instructions could not be delivered, so no session was kept.
    DmFailed,
    /// The platform does not know this member.
    NotAMember,
}

/// Result of a moderator forcing a fresh session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ForceOutcome {
    Started {
        code: VerificationCode,
        expires_at: Timestamp,
    },
    DmFailed,
}

/// Result of a member submitting their profile URL.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// No live session for this member.
    NoSession,
    /// The session timed out; start over.
    Expired,
    /// Malformed URL, session still open.
    InvalidFormat { attempts_remaining: u32 },
    /// Malformed URL on the last allowed attempt; session closed.
    AttemptsExhausted,
    /// The profile could not be retrieved; session still open.
    FetchFailed { reason: String },
    /// The page was retrieved but carried no profile data; session still open.
    ProfileUnreadable { reason: String },
    /// The session was replaced or closed while the profile was being fetched.
    Superseded,
    /// The member is no longer in the community; session closed.
    MemberGone,
    /// The code was not in the bio; session closed and a cooldown applied.
    CodeNotFound {
        cooldown_until: Timestamp,
        cooldown_remaining: String,
    },
    /// Routed to moderators.
    Escalated { review_id: ReviewId, reason: String },
    /// Verified. `marker_removed == false` means the decision stands but the
    /// platform refused the marker change: staff must finish it by hand.
    AutoApproved {
        external_username: String,
        marker_removed: bool,
    },
}

impl SubmitOutcome {
    /// Phase of the member's session after this outcome.
    /// `None` when there was no session to begin with, or the result was discarded.
    pub fn phase(&self) -> Option<SessionPhase> {
        match self {
            Self::NoSession | Self::Superseded => None,
            Self::InvalidFormat { .. } | Self::FetchFailed { .. } | Self::ProfileUnreadable { .. } => {
                Some(SessionPhase::Created)
            }
            Self::Expired => Some(SessionPhase::Expired),
            Self::AttemptsExhausted | Self::MemberGone | Self::CodeNotFound { .. } => {
                Some(SessionPhase::Failed)
            }
            Self::Escalated { .. } => Some(SessionPhase::Escalated),
            Self::AutoApproved { .. } => Some(SessionPhase::Approved),
        }
    }
}

/// A moderator's verdict on a review case.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    Approve,
    Deny { reason: Option<String> },
}

impl Resolution {
    pub const DEFAULT_DENY_REASON: &'static str = "No reason provided";
}

/// Successful resolution of a review case.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ResolveOutcome {
    Approved { member: MemberId, notified: bool },
    Denied {
        member: MemberId,
        reason: String,
        notified: bool,
    },
}

/// What a leave event cleaned up.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LeaveOutcome {
    pub session_cleared: bool,
    pub reviews_purged: Vec<ReviewId>,
}
