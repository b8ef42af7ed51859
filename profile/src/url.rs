//! Strict validation of submitted profile URLs.
//!
//! Accepted forms (scheme `http` or `https`, any letter case):
//! - `https://www.kogama.com/profile/<digits>/`
//! - `https://kogama.com/profile/<digits>/`
//! - `https://friends.kogama.com/profile/<digits>/`
//! - `https://kogama.com.br/profile/<digits>/`
//!
//! The trailing slash is optional.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

fn pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^https?://(www\.|friends\.)?kogama\.(com|com\.br)/profile/(\d+)/?$")
            .expect("profile url pattern is a valid regex")
    })
}

/// A profile URL that passed structural validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUrl {
    raw: String,
    /// Digits exactly as submitted. Not narrowed to an integer, so ids of
    /// any length stay valid.
    profile_id: String,
}

impl ProfileUrl {
    /// Validate a submission. Surrounding whitespace and one pair of
    /// enclosing angle brackets (`<url>`) are stripped first.
    pub fn parse(input: &str) -> Option<Self> {
        let candidate = normalize_submission(input);
        let caps = pattern().captures(candidate)?;
        let profile_id = caps.get(3)?.as_str().to_string();
        Some(Self {
            raw: candidate.to_string(),
            profile_id,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn profile_id(&self) -> &str {
        &self.profile_id
    }
}

impl fmt::Display for ProfileUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Strip whitespace and a single `<...>` wrapper from a chat submission.
pub fn normalize_submission(input: &str) -> &str {
    let trimmed = input.trim();
    trimmed
        .strip_prefix('<')
        .and_then(|s| s.strip_suffix('>'))
        .unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_the_four_forms() {
        for url in [
            "https://www.kogama.com/profile/12345678/",
            "https://kogama.com/profile/12345678/",
            "https://friends.kogama.com/profile/12345678/",
            "https://kogama.com.br/profile/12345678/",
            "http://KOGAMA.com/profile/1",
        ] {
            assert!(ProfileUrl::parse(url).is_some(), "{url} should be accepted");
        }
    }

    #[test]
    fn rejects_lookalikes() {
        for url in [
            "https://evil.kogama.com/profile/1/",
            "https://kogama.com/profile/abc/",
            "https://kogama.com/profile/1/extra",
            "ftp://kogama.com/profile/1/",
            "https://kogama.com.evil.io/profile/1/",
            "kogama.com/profile/1",
            "",
        ] {
            assert!(ProfileUrl::parse(url).is_none(), "{url} should be rejected");
        }
    }

    #[test]
    fn strips_angle_brackets_and_whitespace() {
        let url = ProfileUrl::parse("  <https://kogama.com/profile/77/>  ").unwrap();
        assert_eq!(url.as_str(), "https://kogama.com/profile/77/");
        assert_eq!(url.profile_id(), "77");
    }

    #[test]
    fn ids_wider_than_u64_are_structurally_valid() {
        let long = "123456789012345678901234";
        let url = ProfileUrl::parse(&format!("https://www.kogama.com/profile/{long}/")).unwrap();
        assert_eq!(url.profile_id(), long);
    }
}
