use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

pub mod admin;
pub mod game;
pub mod health;
pub mod public;
pub mod question;
pub mod sse;
pub mod validation;
pub mod voting;

/// Render a timestamp as RFC 3339, the format every payload uses.
pub fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}

/// Parse an RFC 3339 timestamp produced by [`format_system_time`].
pub fn parse_system_time(value: &str) -> Option<SystemTime> {
    OffsetDateTime::parse(value, &Rfc3339)
        .ok()
        .map(SystemTime::from)
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, UNIX_EPOCH};

    use super::*;

    #[test]
    fn timestamps_survive_formatting() {
        let time = UNIX_EPOCH + Duration::from_millis(1_700_000_000_250);
        let formatted = format_system_time(time);
        assert!(formatted.starts_with("2023-11-14T22:13:20.25"));
        assert_eq!(parse_system_time(&formatted), Some(time));
    }

    #[test]
    fn garbage_does_not_parse() {
        assert_eq!(parse_system_time("yesterday"), None);
    }
}
