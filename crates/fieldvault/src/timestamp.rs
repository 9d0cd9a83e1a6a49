//! Timestamp formatting shared by every payload.

use chrono::{DateTime, SecondsFormat, Utc};

/// Current time as an ISO-8601 / RFC 3339 string with microseconds, in UTC.
pub fn now_iso8601() -> String {
    iso8601(Utc::now())
}

pub fn iso8601(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// `reg_YYYYMMDD_HHMMSS` identifier for a registration made at `at`.
pub fn registration_id(at: DateTime<Utc>) -> String {
    format!("reg_{}", at.format("%Y%m%d_%H%M%S"))
}
