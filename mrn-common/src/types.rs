use chrono::{DateTime, Utc};

/// The three relay feeds published for the Mars Relay Network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedKind {
    UplinkWindows,
    Downlinks,
    OrbiterEvents,
}

impl FeedKind {
    pub const ALL: [FeedKind; 3] = [
        FeedKind::UplinkWindows,
        FeedKind::Downlinks,
        FeedKind::OrbiterEvents,
    ];

    /// Feed name as used in the `feed=` query parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedKind::UplinkWindows => "marsrelay",
            FeedKind::Downlinks => "marsrelay_db",
            FeedKind::OrbiterEvents => "marsrelay_oe",
        }
    }
}

impl std::fmt::Display for FeedKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Direction of an uplink session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkType {
    /// Earth to surface asset
    Forward,
    /// Surface asset to orbiter
    Return,
    /// Any other non-blank value, treated as both directions
    Bidirectional(String),
    /// Blank in the feed: the session has not been scheduled
    Unscheduled,
}

impl LinkType {
    pub fn from_feed(raw: Option<&str>) -> Self {
        match raw {
            None => LinkType::Unscheduled,
            Some("forward") => LinkType::Forward,
            Some("return") => LinkType::Return,
            Some(other) => LinkType::Bidirectional(other.to_string()),
        }
    }

    pub fn is_scheduled(&self) -> bool {
        !matches!(self, LinkType::Unscheduled)
    }
}

/// A scheduled communication session between an orbiter and a surface asset
#[derive(Debug, Clone, PartialEq)]
pub struct UplinkWindow {
    pub id: String,
    pub orbiter: String,
    pub lander: String,

    /// Orbiter visibility window
    pub pass_start: Option<DateTime<Utc>>,
    pub pass_end: Option<DateTime<Utc>>,

    /// Narrower window during which contact is attempted
    pub hail_start: Option<DateTime<Utc>>,
    pub hail_end: Option<DateTime<Utc>>,

    pub link_type: LinkType,

    /// Requested rates in kbps
    pub request_forward_rate: Option<i64>,
    pub request_return_rate: Option<i64>,
    pub request_volume_returned: Option<f64>,
    /// Adaptive data rate enabled
    pub request_adr: bool,
}

impl UplinkWindow {
    /// True while `at` lies strictly inside the hail window
    pub fn is_hailing(&self, at: DateTime<Utc>) -> bool {
        match (self.hail_start, self.hail_end) {
            (Some(start), Some(end)) => start < at && at < end,
            _ => false,
        }
    }
}

/// A data transfer from a surface asset to Earth via an orbiter
#[derive(Debug, Clone, PartialEq)]
pub struct Downlink {
    /// Overflight id followed by the raw start time text
    pub id: String,
    pub overflight_id: String,
    pub orbiter: String,
    pub lander: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub bits: Option<i64>,
}

impl Downlink {
    pub fn is_active(&self, at: DateTime<Utc>) -> bool {
        self.start_time < at && at < self.end_time
    }
}

/// Tag of an orbiter event
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OrbiterEventKind {
    /// Ground station track
    DsnTrack,
    /// Instantaneous data rate reading, valid until the next one
    DataRate,
    Other(String),
}

impl OrbiterEventKind {
    pub fn from_feed(raw: &str) -> Self {
        match raw {
            "DSNTrack" => OrbiterEventKind::DsnTrack,
            "DataRate" => OrbiterEventKind::DataRate,
            other => OrbiterEventKind::Other(other.to_string()),
        }
    }
}

/// Auxiliary fact about an orbiter's state during a period
#[derive(Debug, Clone, PartialEq)]
pub struct OrbiterEvent {
    pub orbiter: String,
    pub kind: OrbiterEventKind,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    /// Ground station code
    pub receiver: Option<String>,
    /// Bits per second
    pub data_rate: Option<f64>,
}

impl OrbiterEvent {
    /// Whether the event is in effect at `at`.
    ///
    /// `DataRate` readings never end on their own; a later reading
    /// supersedes them instead.
    pub fn is_active_at(&self, at: DateTime<Utc>) -> bool {
        if self.start_time > at {
            return false;
        }
        match (&self.kind, self.end_time) {
            (OrbiterEventKind::DataRate, _) | (_, None) => true,
            (_, Some(end)) => end > at,
        }
    }
}

/// Any entity produced by the normalizer
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    UplinkWindow(UplinkWindow),
    Downlink(Downlink),
    OrbiterEvent(OrbiterEvent),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_feed_kind_names() {
        let names: Vec<String> = FeedKind::ALL.iter().map(|k| k.to_string()).collect();
        assert_eq!(names, vec!["marsrelay", "marsrelay_db", "marsrelay_oe"]);
    }

    #[test]
    fn test_link_type_from_feed() {
        assert_eq!(LinkType::from_feed(Some("forward")), LinkType::Forward);
        assert_eq!(LinkType::from_feed(Some("return")), LinkType::Return);
        assert_eq!(
            LinkType::from_feed(Some("forward_return")),
            LinkType::Bidirectional("forward_return".to_string())
        );
        assert!(!LinkType::from_feed(None).is_scheduled());
    }

    #[test]
    fn test_data_rate_is_open_ended() {
        let t = |h| Utc.with_ymd_and_hms(2024, 3, 1, h, 0, 0).unwrap();
        let reading = OrbiterEvent {
            orbiter: "MRO".to_string(),
            kind: OrbiterEventKind::DataRate,
            start_time: t(1),
            end_time: Some(t(2)),
            receiver: None,
            data_rate: Some(2048.0),
        };
        assert!(reading.is_active_at(t(5)));
        assert!(!reading.is_active_at(t(0)));

        let track = OrbiterEvent {
            kind: OrbiterEventKind::DsnTrack,
            ..reading
        };
        assert!(track.is_active_at(t(1)));
        assert!(!track.is_active_at(t(2)));
    }
}
