//! Randomly generated tokens: the per-session verification code and the
//! moderator-facing review identifier.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TypesError;

/// The one-time code a member must place in their external profile bio.
///
/// Always uppercase hex, so comparisons against generated codes are exact.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerificationCode(String);

impl VerificationCode {
    /// Generate a fresh code from `bytes` random bytes (two hex chars each).
    pub fn generate(bytes: usize) -> Self {
        let mut buf = vec![0u8; bytes.max(1)];
        rand::thread_rng().fill(buf.as_mut_slice());
        Self(hex::encode_upper(buf))
    }

    /// Wrap an existing code (tests, replays).
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VerificationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a case waiting in the moderator review queue, e.g. `VR-3FA91C`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewId(String);

impl ReviewId {
    /// The prefix every review id starts with.
    pub const PREFIX: &'static str = "VR-";

    pub fn generate(bytes: usize) -> Self {
        let mut buf = vec![0u8; bytes.max(1)];
        rand::thread_rng().fill(buf.as_mut_slice());
        Self(format!("{}{}", Self::PREFIX, hex::encode_upper(buf)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReviewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ReviewId {
    type Err = TypesError;

    /// Moderators type these by hand, so the hex part is accepted in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let valid = upper
            .strip_prefix(Self::PREFIX)
            .is_some_and(|hex| !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()));
        if !valid {
            return Err(TypesError::InvalidReviewId(s.to_string()));
        }
        Ok(Self(upper))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_code_is_uppercase_hex() {
        let code = VerificationCode::generate(4);
        assert_eq!(code.as_str().len(), 8);
        assert!(code
            .as_str()
            .chars()
            .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
    }

    #[test]
    fn review_id_round_trips_through_parse() {
        let id = ReviewId::generate(3);
        assert!(id.as_str().starts_with("VR-"));
        assert_eq!(id.as_str().len(), 9);
        assert_eq!(id.as_str().parse::<ReviewId>().unwrap(), id);
    }

    #[test]
    fn review_id_parse_normalises_case_and_rejects_garbage() {
        assert_eq!(
            "vr-00ff1a".parse::<ReviewId>().unwrap().as_str(),
            "VR-00FF1A"
        );
        assert!("VR-".parse::<ReviewId>().is_err());
        assert!("XX-123456".parse::<ReviewId>().is_err());
        assert!("VR-12345Z".parse::<ReviewId>().is_err());
    }
}
