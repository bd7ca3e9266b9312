//! HTTP date and conditional request module
//!
//! Formats `Date`/`Last-Modified` values and evaluates `If-Modified-Since`.

use chrono::{DateTime, NaiveDateTime, Utc};
use std::time::SystemTime;

/// IMF-fixdate layout, e.g. `Sun, 18 Oct 2026 14:03:07 GMT`
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Format a timestamp as an HTTP date
pub fn format_http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).format(HTTP_DATE_FORMAT).to_string()
}

/// Current time as an HTTP date
pub fn http_date_now() -> String {
    format_http_date(SystemTime::now())
}

/// Parse an IMF-fixdate or RFC 2822 date; obsolete formats are ignored
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, HTTP_DATE_FORMAT)
        .map(|naive| naive.and_utc())
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc2822(value)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        })
}

/// Check whether the client's cached copy is still current
///
/// `If-None-Match` takes precedence: when the client sends it, the date is
/// not evaluated (no ETags are issued, so such requests always get a full
/// response). Sub-second precision of `modified` is ignored since HTTP dates
/// carry whole seconds.
///
/// # Returns
/// Returns true if the response should be 304, false otherwise
pub fn is_not_modified(
    if_modified_since: Option<&str>,
    if_none_match: Option<&str>,
    modified: Option<SystemTime>,
) -> bool {
    if if_none_match.is_some() {
        return false;
    }
    let (Some(header), Some(modified)) = (if_modified_since, modified) else {
        return false;
    };
    let Some(since) = parse_http_date(header) else {
        return false;
    };
    DateTime::<Utc>::from(modified).timestamp() <= since.timestamp()
}
