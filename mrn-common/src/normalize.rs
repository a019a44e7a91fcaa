///! Record normalizer
///!
///! Turns raw relay feed records into typed entities. Normalization is per
///! record: one malformed record is rejected on its own and never spoils the
///! rest of its batch.

use serde::Deserialize;

use crate::error::{NormalizeError, RecordError};
use crate::record::{
    check_interval, feed_text, number, raw_fields, required, required_timestamp, timestamp,
    RawRecord,
};
use crate::types::{
    Downlink, Entity, FeedKind, LinkType, OrbiterEvent, OrbiterEventKind, UplinkWindow,
};

/// Adaptive data rate flag value meaning "disabled"
const ADR_OFF: &str = "ADR_OFF";

/// An entity that can be built from one feed record
pub trait FromRecord: Sized {
    /// Feed carrying this entity
    const FEED: FeedKind;

    fn from_record(record: &RawRecord) -> Result<Self, NormalizeError>;

    /// Best-effort identifier for log messages about a rejected record
    fn describe(record: &RawRecord) -> String;
}

/// Raw `marsrelay` record
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawWindow {
    #[serde(rename = "OVERFLIGHTID", deserialize_with = "feed_text")]
    overflight_id: Option<String>,
    #[serde(rename = "SPACECRAFTORBITER", deserialize_with = "feed_text")]
    orbiter: Option<String>,
    #[serde(rename = "SPACECRAFTLANDER", deserialize_with = "feed_text")]
    lander: Option<String>,
    #[serde(rename = "STARTTIME", deserialize_with = "feed_text")]
    start_time: Option<String>,
    #[serde(rename = "ENDTIME", deserialize_with = "feed_text")]
    end_time: Option<String>,
    #[serde(rename = "HAILSTART", deserialize_with = "feed_text")]
    hail_start: Option<String>,
    #[serde(rename = "HAILEND", deserialize_with = "feed_text")]
    hail_end: Option<String>,
    #[serde(rename = "LINKTYPE", deserialize_with = "feed_text")]
    link_type: Option<String>,
    #[serde(rename = "REQUESTFORWARDLINKDATARATE", deserialize_with = "feed_text")]
    forward_rate: Option<String>,
    #[serde(rename = "REQUESTRETURNLINKDATARATE", deserialize_with = "feed_text")]
    return_rate: Option<String>,
    #[serde(rename = "REQUESTDATAVOLUMERETURNED", deserialize_with = "feed_text")]
    volume_returned: Option<String>,
    #[serde(rename = "REQUESTADR_ENABLE_FLAG", deserialize_with = "feed_text")]
    adr_flag: Option<String>,
}

/// Raw `marsrelay_db` record
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDownlink {
    #[serde(rename = "OVERFLIGHTID", deserialize_with = "feed_text")]
    overflight_id: Option<String>,
    #[serde(rename = "SPACECRAFTORBITER", deserialize_with = "feed_text")]
    orbiter: Option<String>,
    #[serde(rename = "SPACECRAFTLANDER", deserialize_with = "feed_text")]
    lander: Option<String>,
    #[serde(rename = "STARTTIME", deserialize_with = "feed_text")]
    start_time: Option<String>,
    #[serde(rename = "ENDTIME", deserialize_with = "feed_text")]
    end_time: Option<String>,
    #[serde(rename = "BITS", deserialize_with = "feed_text")]
    bits: Option<String>,
}

/// Raw `marsrelay_oe` record
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawEvent {
    #[serde(rename = "SPACECRAFTORBITER", deserialize_with = "feed_text")]
    orbiter: Option<String>,
    #[serde(rename = "TYPE", deserialize_with = "feed_text")]
    kind: Option<String>,
    #[serde(rename = "STARTTIME", deserialize_with = "feed_text")]
    start_time: Option<String>,
    #[serde(rename = "ENDTIME", deserialize_with = "feed_text")]
    end_time: Option<String>,
    #[serde(rename = "RECEIVER", deserialize_with = "feed_text")]
    receiver: Option<String>,
    #[serde(rename = "DATARATE", deserialize_with = "feed_text")]
    data_rate: Option<String>,
}

impl FromRecord for UplinkWindow {
    const FEED: FeedKind = FeedKind::UplinkWindows;

    fn from_record(record: &RawRecord) -> Result<Self, NormalizeError> {
        let raw: RawWindow = raw_fields(record)?;

        let pass_start = timestamp("STARTTIME", raw.start_time.as_deref())?;
        let pass_end = timestamp("ENDTIME", raw.end_time.as_deref())?;
        let hail_start = timestamp("HAILSTART", raw.hail_start.as_deref())?;
        let hail_end = timestamp("HAILEND", raw.hail_end.as_deref())?;
        check_interval(pass_start, pass_end, "STARTTIME", "ENDTIME")?;
        check_interval(hail_start, hail_end, "HAILSTART", "HAILEND")?;

        Ok(UplinkWindow {
            id: required("OVERFLIGHTID", raw.overflight_id)?,
            orbiter: required("SPACECRAFTORBITER", raw.orbiter)?,
            lander: required("SPACECRAFTLANDER", raw.lander)?,
            pass_start,
            pass_end,
            hail_start,
            hail_end,
            link_type: LinkType::from_feed(raw.link_type.as_deref()),
            request_forward_rate: number("REQUESTFORWARDLINKDATARATE", raw.forward_rate)?,
            request_return_rate: number("REQUESTRETURNLINKDATARATE", raw.return_rate)?,
            request_volume_returned: number("REQUESTDATAVOLUMERETURNED", raw.volume_returned)?,
            request_adr: raw.adr_flag.is_some_and(|flag| flag != ADR_OFF),
        })
    }

    fn describe(record: &RawRecord) -> String {
        raw_fields::<RawWindow>(record)
            .ok()
            .and_then(|raw| raw.overflight_id)
            .unwrap_or_else(|| "<no OVERFLIGHTID>".to_string())
    }
}

impl FromRecord for Downlink {
    const FEED: FeedKind = FeedKind::Downlinks;

    fn from_record(record: &RawRecord) -> Result<Self, NormalizeError> {
        let raw: RawDownlink = raw_fields(record)?;

        let overflight_id = required("OVERFLIGHTID", raw.overflight_id)?;
        let start_text = required("STARTTIME", raw.start_time)?;
        let start_time = required_timestamp("STARTTIME", Some(&start_text))?;
        let end_time = required_timestamp("ENDTIME", raw.end_time.as_deref())?;
        check_interval(Some(start_time), Some(end_time), "STARTTIME", "ENDTIME")?;

        Ok(Downlink {
            id: format!("{}{}", overflight_id, start_text),
            overflight_id,
            orbiter: required("SPACECRAFTORBITER", raw.orbiter)?,
            lander: required("SPACECRAFTLANDER", raw.lander)?,
            start_time,
            end_time,
            bits: number("BITS", raw.bits)?,
        })
    }

    fn describe(record: &RawRecord) -> String {
        raw_fields::<RawDownlink>(record)
            .ok()
            .and_then(|raw| raw.overflight_id)
            .unwrap_or_else(|| "<no OVERFLIGHTID>".to_string())
    }
}

impl FromRecord for OrbiterEvent {
    const FEED: FeedKind = FeedKind::OrbiterEvents;

    fn from_record(record: &RawRecord) -> Result<Self, NormalizeError> {
        let raw: RawEvent = raw_fields(record)?;

        let kind = OrbiterEventKind::from_feed(&required("TYPE", raw.kind)?);
        let start_time = required_timestamp("STARTTIME", raw.start_time.as_deref())?;
        let end_time = timestamp("ENDTIME", raw.end_time.as_deref())?;
        if kind != OrbiterEventKind::DataRate {
            check_interval(Some(start_time), end_time, "STARTTIME", "ENDTIME")?;
        }

        Ok(OrbiterEvent {
            orbiter: required("SPACECRAFTORBITER", raw.orbiter)?,
            kind,
            start_time,
            end_time,
            receiver: raw.receiver,
            data_rate: number("DATARATE", raw.data_rate)?,
        })
    }

    fn describe(record: &RawRecord) -> String {
        match raw_fields::<RawEvent>(record) {
            Ok(raw) => format!(
                "{}/{}@{}",
                raw.orbiter.as_deref().unwrap_or("?"),
                raw.kind.as_deref().unwrap_or("?"),
                raw.start_time.as_deref().unwrap_or("?"),
            ),
            Err(_) => "<non-object>".to_string(),
        }
    }
}

/// Normalize one record of the given feed
pub fn normalize(kind: FeedKind, record: &RawRecord) -> Result<Entity, RecordError> {
    match kind {
        FeedKind::UplinkWindows => normalize_one::<UplinkWindow>(record).map(Entity::UplinkWindow),
        FeedKind::Downlinks => normalize_one::<Downlink>(record).map(Entity::Downlink),
        FeedKind::OrbiterEvents => normalize_one::<OrbiterEvent>(record).map(Entity::OrbiterEvent),
    }
}

fn normalize_one<T: FromRecord>(record: &RawRecord) -> Result<T, RecordError> {
    T::from_record(record).map_err(|source| RecordError {
        record_id: T::describe(record),
        source,
    })
}

/// Result of normalizing a whole feed
#[derive(Debug, Clone)]
pub struct NormalizedBatch<T> {
    /// Entities in feed order
    pub entities: Vec<T>,
    /// Records that were skipped, with the reason
    pub rejected: Vec<RecordError>,
}

/// Normalize every record of a feed, keeping the good ones
pub fn normalize_batch<T: FromRecord>(records: &[RawRecord]) -> NormalizedBatch<T> {
    let mut entities = Vec::with_capacity(records.len());
    let mut rejected = Vec::new();

    for record in records {
        match normalize_one::<T>(record) {
            Ok(entity) => entities.push(entity),
            Err(e) => rejected.push(e),
        }
    }

    NormalizedBatch { entities, rejected }
}
