//! Relative age formatting

use chrono::{DateTime, Utc};

/// Age of `timestamp` relative to `now`: "just now", "Nm ago", "Nh ago", "Nd ago"
///
/// Timestamps in the future (clock skew) count as "just now".
pub fn relative_age(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = now.signed_duration_since(timestamp).num_seconds();

    if seconds < 60 {
        "just now".to_string()
    } else if seconds < 3_600 {
        format!("{}m ago", seconds / 60)
    } else if seconds < 86_400 {
        format!("{}h ago", seconds / 3_600)
    } else {
        format!("{}d ago", seconds / 86_400)
    }
}
