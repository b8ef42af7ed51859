//! Session lifecycle phases.
//!
//! A session is born `Created` and leaves the store on its first terminal
//! transition. It never re-enters `Created`.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Open and accepting submissions.
    Created,
    /// Timed out before a valid submission.
    Expired,
    /// Ended by a malformed-URL streak, a code mismatch, or the member leaving.
    Failed,
    /// Handed to moderators as a review case.
    Escalated,
    /// Auto-approved.
    Approved,
}

impl SessionPhase {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Created)
    }
}

/// Why a session ended in [`SessionPhase::Failed`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCause {
    /// Too many structurally invalid profile URLs.
    AttemptsExhausted,
    /// The issued code was not in the profile bio.
    CodeMismatch,
    /// The member left the community mid-session.
    MemberGone,
    /// The instructions could not be delivered, so the session was dropped.
    DmFailed,
}
