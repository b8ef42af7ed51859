//! Extraction of the profile data blob embedded in a profile page.
//!
//! Profile pages carry their data as a script assignment:
//!
//! ```text
//! options.bootstrap = { "object": { "id": 1, "username": "...", ... }, ... };
//! ```
//!
//! The object literal is located by a brace-balanced scan (string-aware, so
//! braces inside the bio do not end it early) and then parsed as JSON.

use biogate_types::Timestamp;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;

use crate::error::FetchError;
use crate::profile::ExternalProfile;

const MARKER: &str = "options.bootstrap";

#[derive(Debug, Deserialize)]
struct Bootstrap {
    object: Option<ProfileObject>,
}

#[derive(Debug, Deserialize)]
struct ProfileObject {
    id: u64,
    username: String,
    created: serde_json::Value,
    #[serde(default)]
    last_ping: serde_json::Value,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    level: u32,
}

/// Parse a fetched profile page into an [`ExternalProfile`].
pub fn parse_profile_page(html: &str) -> Result<ExternalProfile, FetchError> {
    let blob = extract_blob(html).ok_or_else(|| FetchError::Parse("bootstrap blob not found".into()))?;
    let bootstrap: Bootstrap =
        serde_json::from_str(blob).map_err(|e| FetchError::Parse(format!("bootstrap json: {e}")))?;
    let object = bootstrap
        .object
        .ok_or_else(|| FetchError::Parse("bootstrap has no profile object".into()))?;

    let created_at = parse_time(&object.created)
        .ok_or_else(|| FetchError::Parse(format!("unreadable creation date: {}", object.created)))?;

    Ok(ExternalProfile {
        username: object.username,
        external_id: object.id,
        created_at,
        last_active_at: parse_time(&object.last_ping),
        bio: object.description.unwrap_or_default(),
        level: object.level,
    })
}

/// Locate the `{ ... }` literal assigned to `options.bootstrap`.
pub fn extract_blob(html: &str) -> Option<&str> {
    let after_marker = &html[html.find(MARKER)? + MARKER.len()..];
    let after_eq = after_marker.trim_start().strip_prefix('=')?;
    let start = html.len() - after_eq.trim_start().len();
    let body = &html[start..];
    if !body.starts_with('{') {
        return None;
    }

    let mut depth = 0usize;
    let mut in_string: Option<char> = None;
    let mut escaped = false;
    for (i, c) in body.char_indices() {
        if let Some(quote) = in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == quote {
                in_string = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => in_string = Some(c),
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&body[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS`, bare dates, and epoch seconds.
fn parse_time(value: &serde_json::Value) -> Option<Timestamp> {
    match value {
        serde_json::Value::Number(n) => n.as_u64().map(Timestamp::from_secs),
        serde_json::Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return millis(dt.timestamp_millis());
            }
            for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
                if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
                    return millis(dt.and_utc().timestamp_millis());
                }
            }
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .and_then(|dt| millis(dt.and_utc().timestamp_millis()))
        }
        _ => None,
    }
}

fn millis(ms: i64) -> Option<Timestamp> {
    u64::try_from(ms).ok().map(Timestamp::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><script>
        var options = {};
        options.bootstrap = {"object": {"id": 668, "username": "Builder", "created": "2015-03-01T10:00:00+00:00",
            "last_ping": "2024-01-02 03:04:05", "description": "  hi {not a brace} \"AB12CD34\"  ", "level": 31}, "x": 1};
        options.other = {};
    </script></html>"#;

    #[test]
    fn extracts_balanced_blob() {
        let blob = extract_blob(PAGE).unwrap();
        assert!(blob.starts_with('{'));
        assert!(blob.ends_with("\"x\": 1}"));
    }

    #[test]
    fn parses_profile_fields() {
        let profile = parse_profile_page(PAGE).unwrap();
        assert_eq!(profile.username, "Builder");
        assert_eq!(profile.external_id, 668);
        assert_eq!(profile.level, 31);
        assert_eq!(profile.created_at.as_secs(), 1_425_204_000);
        assert!(profile.last_active_at.is_some());
        assert!(profile.bio_contains("AB12CD34"));
    }

    #[test]
    fn missing_blob_is_a_parse_error() {
        let err = parse_profile_page("<html>nothing here</html>").unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn missing_object_is_a_parse_error() {
        let err = parse_profile_page("options.bootstrap = {\"x\": 1};").unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn parse_time_accepts_several_formats() {
        let v = |s: &str| serde_json::Value::String(s.to_string());
        assert_eq!(parse_time(&v("1970-01-02")), Some(Timestamp::from_secs(86_400)));
        assert_eq!(
            parse_time(&v("1970-01-01 00:01:00")),
            Some(Timestamp::from_secs(60))
        );
        assert_eq!(parse_time(&serde_json::json!(120)), Some(Timestamp::from_secs(120)));
        assert_eq!(parse_time(&v("yesterday")), None);
    }
}
