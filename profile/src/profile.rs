//! Profile data extracted from an external account page.

use biogate_types::Timestamp;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalProfile {
    pub username: String,
    pub external_id: u64,
    pub created_at: Timestamp,
    pub last_active_at: Option<Timestamp>,
    /// Free-text bio exactly as published (untrimmed).
    pub bio: String,
    pub level: u32,
}

impl ExternalProfile {
    /// Whether `code` appears in the bio, ignoring surrounding whitespace.
    /// Case-sensitive: codes are always issued uppercase.
    pub fn bio_contains(&self, code: &str) -> bool {
        self.bio.trim().contains(code)
    }
}
