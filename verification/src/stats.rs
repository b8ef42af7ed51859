//! Engine counters.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Counter {
    SessionsStarted,
    SessionsExpired,
    SessionsFailed,
    AutoApproved,
    Escalated,
    ReviewsApproved,
    ReviewsDenied,
    Punishments,
}

const COUNTER_COUNT: usize = 8;

impl Counter {
    pub const ALL: [Counter; COUNTER_COUNT] = [
        Counter::SessionsStarted,
        Counter::SessionsExpired,
        Counter::SessionsFailed,
        Counter::AutoApproved,
        Counter::Escalated,
        Counter::ReviewsApproved,
        Counter::ReviewsDenied,
        Counter::Punishments,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::SessionsStarted => "sessions_started",
            Self::SessionsExpired => "sessions_expired",
            Self::SessionsFailed => "sessions_failed",
            Self::AutoApproved => "auto_approved",
            Self::Escalated => "escalated",
            Self::ReviewsApproved => "reviews_approved",
            Self::ReviewsDenied => "reviews_denied",
            Self::Punishments => "punishments",
        }
    }
}

/// Lock-free counters, readable while the engine is busy.
#[derive(Debug, Default)]
pub struct EngineStats {
    counters: [AtomicU64; COUNTER_COUNT],
}

impl EngineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self, counter: Counter) {
        self.counters[counter as usize].fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self, counter: Counter) -> u64 {
        self.counters[counter as usize].load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> BTreeMap<&'static str, u64> {
        Counter::ALL
            .iter()
            .map(|c| (c.name(), self.get(*c)))
            .collect()
    }
}
