// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, SecondsFormat, Utc};

/// Current time as Unix seconds, the score unit of time-ordered sets.
pub fn now_unix() -> i64 {
    Utc::now().timestamp()
}

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Format Unix seconds as RFC3339; out-of-range values clamp to the epoch.
pub fn format_unix_rfc3339(secs: i64) -> String {
    format_utc_rfc3339(DateTime::from_timestamp(secs, 0).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_unix() {
        assert_eq!(format_unix_rfc3339(0), "1970-01-01T00:00:00Z");
        assert_eq!(format_unix_rfc3339(1_704_103_200), "2024-01-01T10:00:00Z");
        assert_eq!(format_unix_rfc3339(i64::MAX), "1970-01-01T00:00:00Z");
    }
}
