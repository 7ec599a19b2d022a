//! Time and timestamp helpers.

use chrono::{DateTime, SecondsFormat, Utc};

/// UTC timestamp used on revertives, status reports and readings.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Render a timestamp as ISO-8601 with millisecond precision and a `Z`
/// suffix, e.g. `2024-01-31T18:04:05.123Z`.
#[must_use]
pub fn to_iso_string(ts: Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Current time rendered with [`to_iso_string`].
#[must_use]
pub fn iso_now() -> String {
    to_iso_string(now())
}
