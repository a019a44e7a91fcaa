///! Day-of-year timestamp codec used by the relay feeds
///!
///! The feeds encode instants as `YYYY-DDDTHH:MM:SS.mmm`, where `DDD` is the
///! ordinal day of the year (001 = January 1st). All instants are UTC.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::NormalizeError;

/// `%.f` also accepts a timestamp without the fractional part
const DOY_PARSE_FORMAT: &str = "%Y-%jT%H:%M:%S%.f";
const DOY_FORMAT: &str = "%Y-%jT%H:%M:%S%.3f";

/// Null markers emitted by the feeds in place of a value
pub const NULL_SENTINELS: [&str; 2] = ["", "NULL"];

/// Returns true when a raw feed string stands for "no value"
pub fn is_null_sentinel(raw: &str) -> bool {
    NULL_SENTINELS.contains(&raw.trim())
}

/// Parse a day-of-year timestamp.
///
/// Returns `Ok(None)` for the null sentinels and an error naming `field`
/// when the string is present but malformed.
pub fn parse_doy_timestamp(
    field: &'static str,
    raw: &str,
) -> Result<Option<DateTime<Utc>>, NormalizeError> {
    if is_null_sentinel(raw) {
        return Ok(None);
    }

    NaiveDateTime::parse_from_str(raw.trim(), DOY_PARSE_FORMAT)
        .map(|naive| Some(naive.and_utc()))
        .map_err(|_| NormalizeError::InvalidDate {
            field,
            value: raw.to_string(),
        })
}

/// Render an instant back into the feed's day-of-year encoding
pub fn format_doy_timestamp(instant: &DateTime<Utc>) -> String {
    instant.format(DOY_FORMAT).to_string()
}
