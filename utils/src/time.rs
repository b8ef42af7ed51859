//! Duration formatting helpers.

use std::time::Duration;

/// Format a duration to a compact human-readable string.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs < 86400 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else {
        format!("{}d {}h", secs / 86400, (secs % 86400) / 3600)
    }
}

/// Format as whole hours and minutes, e.g. `"1h 59m"`. Used for lockout messages.
pub fn format_hours_minutes(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
}
