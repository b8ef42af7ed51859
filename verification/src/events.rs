//! Audit events: one structured record per state transition.
//!
//! Events are buffered in a bounded FIFO and drained by the host, which
//! forwards them to its audit log. When the buffer is full the oldest event
//! is dropped.

use biogate_types::{MemberId, ReviewId, Timestamp};
use serde::Serialize;
use std::collections::VecDeque;

use crate::state::FailureCause;

/// Default capacity of the pending-event buffer.
pub const DEFAULT_EVENT_CAPACITY: usize = 4096;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditEvent {
    SessionCreated {
        member: MemberId,
        created_at: Timestamp,
        expires_at: Timestamp,
        forced: bool,
    },
    SessionExpired {
        member: MemberId,
        started_at: Timestamp,
        expired_at: Timestamp,
        attempts: u32,
    },
    SessionFailed {
        member: MemberId,
        cause: FailureCause,
        attempts: u32,
    },
    PunishmentApplied {
        member: MemberId,
        until: Timestamp,
        reason: String,
    },
    ReviewEscalated {
        member: MemberId,
        review_id: ReviewId,
        reason: String,
    },
    AutoApproved {
        member: MemberId,
        external_username: String,
        marker_removed: bool,
    },
    ReviewApproved {
        member: MemberId,
        review_id: ReviewId,
        moderator: MemberId,
    },
    ReviewDenied {
        member: MemberId,
        review_id: ReviewId,
        moderator: MemberId,
        reason: String,
    },
    ReviewPurged {
        member: MemberId,
        review_id: ReviewId,
    },
    DebugTriggered {
        actor: MemberId,
        member: MemberId,
    },
}

impl AuditEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SessionCreated { .. } => "session_created",
            Self::SessionExpired { .. } => "session_expired",
            Self::SessionFailed { .. } => "session_failed",
            Self::PunishmentApplied { .. } => "punishment_applied",
            Self::ReviewEscalated { .. } => "review_escalated",
            Self::AutoApproved { .. } => "auto_approved",
            Self::ReviewApproved { .. } => "review_approved",
            Self::ReviewDenied { .. } => "review_denied",
            Self::ReviewPurged { .. } => "review_purged",
            Self::DebugTriggered { .. } => "debug_triggered",
        }
    }

    /// The member the event is about.
    pub fn member(&self) -> &MemberId {
        match self {
            Self::SessionCreated { member, .. }
            | Self::SessionExpired { member, .. }
            | Self::SessionFailed { member, .. }
            | Self::PunishmentApplied { member, .. }
            | Self::ReviewEscalated { member, .. }
            | Self::AutoApproved { member, .. }
            | Self::ReviewApproved { member, .. }
            | Self::ReviewDenied { member, .. }
            | Self::ReviewPurged { member, .. }
            | Self::DebugTriggered { member, .. } => member,
        }
    }
}

/// Bounded FIFO of events not yet drained.
#[derive(Debug)]
pub struct EventBuffer {
    events: VecDeque<AuditEvent>,
    capacity: usize,
    dropped: u64,
}

impl EventBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::new(),
            capacity,
            dropped: 0,
        }
    }

    pub fn push(&mut self, event: AuditEvent) {
        if self.capacity == 0 {
            self.dropped += 1;
            return;
        }
        if self.events.len() >= self.capacity {
            self.events.pop_front();
            self.dropped += 1;
        }
        self.events.push_back(event);
    }

    pub fn drain(&mut self) -> Vec<AuditEvent> {
        self.events.drain(..).collect()
    }

    /// Events discarded because the buffer was full.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn purged(n: u8) -> AuditEvent {
        AuditEvent::ReviewPurged {
            member: MemberId::new(format!("m{n}")),
            review_id: format!("VR-0000{n:02X}").parse().unwrap(),
        }
    }

    #[test]
    fn drain_clears_buffer() {
        let mut buf = EventBuffer::new(8);
        buf.push(purged(1));
        assert_eq!(buf.drain().len(), 1);
        assert!(buf.drain().is_empty());
    }

    #[test]
    fn oldest_event_is_evicted_at_capacity() {
        let mut buf = EventBuffer::new(2);
        buf.push(purged(1));
        buf.push(purged(2));
        buf.push(purged(3));
        let drained = buf.drain();
        assert_eq!(drained, vec![purged(2), purged(3)]);
        assert_eq!(buf.dropped(), 1);
    }

    #[test]
    fn events_serialize_with_tag() {
        let json = serde_json::to_value(purged(1)).unwrap();
        assert_eq!(json["event"], "review_purged");
        assert_eq!(json["member"], "m1");
        assert_eq!(purged(1).kind(), "review_purged");
    }
}
