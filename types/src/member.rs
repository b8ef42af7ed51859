//! Member identity as seen by the verification engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TypesError;
use crate::time::Timestamp;

/// Opaque, stable identifier of a community member (the platform's user id).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(String);

impl MemberId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MemberId {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
            return Err(TypesError::InvalidMemberId(s.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl From<&str> for MemberId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A membership snapshot for one member, owned by the chat platform.
///
/// The presence of the unverified marker is the ground truth for
/// verification status; the engine only caches it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberInfo {
    pub id: MemberId,
    /// Human-readable handle, used only for logs and review cases.
    pub display_name: String,
    /// When the member's platform account was created.
    pub account_created_at: Timestamp,
    /// When the member joined the community, if known.
    #[serde(default)]
    pub joined_at: Option<Timestamp>,
    /// Whether the member currently carries the unverified marker.
    pub has_unverified_marker: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims_and_rejects_blank() {
        assert_eq!("  1234 ".parse::<MemberId>().unwrap().as_str(), "1234");
        assert!("".parse::<MemberId>().is_err());
        assert!("12 34".parse::<MemberId>().is_err());
    }

    #[test]
    fn member_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&MemberId::new("42")).unwrap();
        assert_eq!(json, "\"42\"");
    }
}
