///! Loosely-typed feed record access
///!
///! Feed records are flat JSON objects whose values are almost always strings.
///! Blank strings and `"NULL"` stand for missing values. Raw record structs
///! read every field through [`feed_text`], so nothing downstream ever sees a
///! sentinel.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::date::{is_null_sentinel, parse_doy_timestamp};
use crate::error::NormalizeError;

/// One record exactly as it came off the wire
pub type RawRecord = Value;

/// Deserialize a record into its raw field struct
pub fn raw_fields<'a, T: Deserialize<'a>>(record: &'a RawRecord) -> Result<T, NormalizeError> {
    if !record.is_object() {
        return Err(NormalizeError::NotAnObject);
    }
    T::deserialize(record).map_err(|_| NormalizeError::NotAnObject)
}

/// `deserialize_with` helper: a field as trimmed text.
///
/// JSON null, nested values and the null sentinels all become `None`;
/// numbers and booleans keep their JSON spelling.
pub fn feed_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let text = match Value::deserialize(deserializer)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return Ok(None),
    };
    if is_null_sentinel(&text) {
        Ok(None)
    } else {
        Ok(Some(text))
    }
}

pub fn required(field: &'static str, value: Option<String>) -> Result<String, NormalizeError> {
    value.ok_or(NormalizeError::MissingField(field))
}

pub fn number<T: FromStr>(field: &'static str, value: Option<String>) -> Result<Option<T>, NormalizeError> {
    match value {
        None => Ok(None),
        Some(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|_| NormalizeError::InvalidNumber { field, value }),
    }
}

pub fn timestamp(field: &'static str, value: Option<&str>) -> Result<Option<DateTime<Utc>>, NormalizeError> {
    match value {
        None => Ok(None),
        Some(raw) => parse_doy_timestamp(field, raw),
    }
}

pub fn required_timestamp(field: &'static str, value: Option<&str>) -> Result<DateTime<Utc>, NormalizeError> {
    timestamp(field, value)?.ok_or(NormalizeError::MissingField(field))
}

/// Reject intervals whose end precedes their start; open ends pass
pub fn check_interval(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    start_field: &'static str,
    end_field: &'static str,
) -> Result<(), NormalizeError> {
    match (start, end) {
        (Some(start), Some(end)) if start > end => Err(NormalizeError::InvertedInterval {
            start_field,
            end_field,
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct Sample {
        #[serde(rename = "A", deserialize_with = "feed_text")]
        a: Option<String>,
        #[serde(rename = "B", deserialize_with = "feed_text")]
        b: Option<String>,
        #[serde(rename = "C", deserialize_with = "feed_text")]
        c: Option<String>,
        #[serde(rename = "D", deserialize_with = "feed_text")]
        d: Option<String>,
        #[serde(rename = "E", deserialize_with = "feed_text")]
        e: Option<String>,
        #[serde(rename = "F", deserialize_with = "feed_text")]
        f: Option<String>,
    }

    #[test]
    fn test_text_sentinels() {
        let record = json!({"A": "", "B": "NULL", "C": null, "D": " MRO ", "E": 42, "F": {"nested": 1}});
        let sample: Sample = raw_fields(&record).unwrap();
        assert_eq!(sample.a, None);
        assert_eq!(sample.b, None);
        assert_eq!(sample.c, None);
        assert_eq!(sample.d.as_deref(), Some("MRO"));
        assert_eq!(sample.e.as_deref(), Some("42"));
        assert_eq!(sample.f, None);

        let empty: Sample = raw_fields(&json!({})).unwrap();
        assert_eq!(empty.d, None);
    }

    #[test]
    fn test_number_parsing() {
        assert_eq!(number::<i64>("RATE", Some("2048".to_string())).unwrap(), Some(2048));
        assert_eq!(number::<i64>("RATE", None).unwrap(), None);
        assert_eq!(number::<f64>("VOL", Some("12.5".to_string())).unwrap(), Some(12.5));
        assert_eq!(
            number::<i64>("BAD", Some("fast".to_string())).unwrap_err(),
            NormalizeError::InvalidNumber {
                field: "BAD",
                value: "fast".to_string()
            }
        );
    }

    #[test]
    fn test_required_fields() {
        assert_eq!(
            required("OVERFLIGHTID", None).unwrap_err(),
            NormalizeError::MissingField("OVERFLIGHTID")
        );
        assert_eq!(
            required_timestamp("STARTTIME", None).unwrap_err(),
            NormalizeError::MissingField("STARTTIME")
        );
    }

    #[test]
    fn test_non_object_rejected() {
        assert_eq!(
            raw_fields::<Sample>(&json!(["not", "a", "record"])).unwrap_err(),
            NormalizeError::NotAnObject
        );
    }
}
