//! Timestamp and age formatting.

use std::time::Duration;

use chrono::{DateTime, Local, Utc};

/// Human data age for the header, e.g. `2m 5s ago`.
pub fn fmt_age(age: chrono::Duration) -> String {
    let secs = age.num_seconds();
    if secs < 5 {
        return "just now".into();
    }
    let secs = u64::try_from(secs).unwrap_or_default();
    format!("{} ago", humantime::format_duration(Duration::from_secs(secs)))
}

/// Full local timestamp.
pub fn local_time(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Wall-clock time only, for dense lists.
pub fn short_time(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recent_and_future_ages_read_as_just_now() {
        assert_eq!(fmt_age(chrono::Duration::seconds(3)), "just now");
        assert_eq!(fmt_age(chrono::Duration::seconds(-30)), "just now");
    }

    #[test]
    fn older_ages_use_humantime() {
        assert_eq!(fmt_age(chrono::Duration::seconds(125)), "2m 5s ago");
        assert_eq!(fmt_age(chrono::Duration::seconds(3600)), "1h ago");
    }
}
