//! Rate limiting and punitive cooldowns.
//!
//! Two independent gates guard session creation, evaluated in this order:
//! 1. **Punitive cooldown**: a multi-hour lockout recorded after a failed code check.
//! 2. **Attempt cooldown**: minimum spacing between two session starts.
//!
//! Both records outlive any single session.

use biogate_types::{MemberId, Timestamp};
use std::collections::HashMap;
use std::time::Duration;

/// Why a session start was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThrottleRefusal {
    /// Punitive cooldown still running.
    Cooldown { until: Timestamp, remaining: Duration },
    /// Started another session too recently.
    RateLimited { remaining: Duration },
}

#[derive(Debug, Default)]
pub struct ThrottleTracker {
    /// Member → instant of the last session start that passed the gate.
    last_attempt: HashMap<MemberId, Timestamp>,
    /// Member → instant the punitive cooldown ends.
    cooldown_until: HashMap<MemberId, Timestamp>,
}

impl ThrottleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remaining punitive cooldown, if one is active at `now`.
    pub fn cooldown_remaining(&self, member: &MemberId, now: Timestamp) -> Option<(Timestamp, Duration)> {
        self.cooldown_until
            .get(member)
            .filter(|until| now < **until)
            .map(|until| (*until, until.remaining_from(now)))
    }

    /// Run both gates. On success the attempt is recorded at `now`.
    ///
    /// A refusal records nothing, so a member hammering the command while
    /// limited does not extend their own wait.
    pub fn admit(
        &mut self,
        member: &MemberId,
        now: Timestamp,
        attempt_cooldown: Duration,
    ) -> Result<(), ThrottleRefusal> {
        if let Some((until, remaining)) = self.cooldown_remaining(member, now) {
            return Err(ThrottleRefusal::Cooldown { until, remaining });
        }

        if let Some(last) = self.last_attempt.get(member) {
            let elapsed = last.elapsed_since(now);
            if elapsed < attempt_cooldown {
                return Err(ThrottleRefusal::RateLimited {
                    remaining: attempt_cooldown - elapsed,
                });
            }
        }

        self.last_attempt.insert(member.clone(), now);
        Ok(())
    }

    /// Lock the member out until `now + duration`. Leaves the attempt record alone.
    pub fn apply_punishment(&mut self, member: &MemberId, now: Timestamp, duration: Duration) -> Timestamp {
        let until = now.plus(duration);
        self.cooldown_until.insert(member.clone(), until);
        until
    }

    /// Forget both records for a member (administrative override).
    pub fn clear(&mut self, member: &MemberId) {
        self.last_attempt.remove(member);
        self.cooldown_until.remove(member);
    }

    /// Drop records that can no longer refuse anything.
    pub fn prune(&mut self, now: Timestamp, attempt_cooldown: Duration) {
        self.cooldown_until.retain(|_, until| now < *until);
        self.last_attempt
            .retain(|_, last| last.elapsed_since(now) < attempt_cooldown);
    }
}
