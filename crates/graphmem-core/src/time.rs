//! Time Utilities

use chrono::{DateTime, Utc};

/// Get current UTC timestamp
pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

/// Parse datetime from an ISO-8601 string.
///
/// Accepts RFC 3339 and the offset-less form the service emits for naive
/// datetimes, which are taken as UTC.
pub fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Format datetime as RFC 3339 string
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}
