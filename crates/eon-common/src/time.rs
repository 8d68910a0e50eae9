//! Timestamp helpers for registry and summary metadata.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};

/// Fixed offset subtracted from instants to produce the observatory clock.
///
/// This is a constant shift, not a timezone rule: it ignores daylight saving.
pub const LOCAL_OFFSET_HOURS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeParseError {
    #[error("Invalid time format: {0}")]
    InvalidFormat(String),
}

/// Parse an ISO-8601 style timestamp.
///
/// Accepts RFC 3339, naive date-times (`T` or space separated, optional
/// fractional seconds; assumed UTC) and bare dates (midnight UTC).
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, TimeParseError> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(Utc.from_utc_datetime(&ndt));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(ndt) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&ndt));
        }
    }

    Err(TimeParseError::InvalidFormat(s.to_string()))
}

/// Render an instant as the observatory wall clock, `H:MM:SS local`.
pub fn local_display_time(timestamp: &str) -> Result<String, TimeParseError> {
    let instant = parse_timestamp(timestamp)?;
    Ok(format_local_clock(instant))
}

/// Same as [`local_display_time`] for an already parsed instant.
pub fn format_local_clock(instant: DateTime<Utc>) -> String {
    let local = instant - Duration::hours(LOCAL_OFFSET_HOURS);
    format!(
        "{}:{:02}:{:02} local",
        local.hour(),
        local.minute(),
        local.second()
    )
}
