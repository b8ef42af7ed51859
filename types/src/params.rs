//! Engine parameters: every timing and threshold the verification flow uses.
//!
//! All durations are stored in seconds so the struct maps cleanly onto TOML.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for the verification engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineParams {
    // ── Sessions ─────────────────────────────────────────────────────────
    /// How long a session stays open after creation. Default: 10 minutes.
    pub session_timeout_secs: u64,

    /// Code submissions allowed per session before a malformed URL ends it.
    pub max_attempts: u32,

    /// Random bytes in a verification code (rendered as two hex chars each).
    pub code_bytes: usize,

    // ── Throttles ────────────────────────────────────────────────────────
    /// Minimum spacing between two session starts by the same member.
    pub attempt_cooldown_secs: u64,

    /// Lockout applied after a code check fails. Default: 2 hours.
    pub punishment_secs: u64,

    // ── Risk ─────────────────────────────────────────────────────────────
    /// Platform accounts younger than this are routed to manual review.
    pub min_platform_account_age_days: u64,

    /// External accounts younger than this are routed to manual review.
    pub min_external_account_age_days: u64,

    // ── Review queue ─────────────────────────────────────────────────────
    /// Random bytes in a review id after the `VR-` prefix.
    pub review_id_bytes: usize,
}

impl EngineParams {
    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_secs)
    }

    pub fn attempt_cooldown(&self) -> Duration {
        Duration::from_secs(self.attempt_cooldown_secs)
    }

    pub fn punishment(&self) -> Duration {
        Duration::from_secs(self.punishment_secs)
    }
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            session_timeout_secs: 10 * 60,
            max_attempts: 3,
            code_bytes: 4,
            attempt_cooldown_secs: 60,
            punishment_secs: 2 * 60 * 60,
            min_platform_account_age_days: 365,
            min_external_account_age_days: 365,
            review_id_bytes: 3,
        }
    }
}
