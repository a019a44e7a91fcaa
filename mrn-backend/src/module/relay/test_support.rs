///! Fakes and fixtures shared by the relay tests

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use mrn_common::{Downlink, FeedKind, LinkType, RawRecord, UplinkWindow};
use reqwest::StatusCode;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::feed::{FeedSource, FetchError};
use super::state::{SeenState, StatePersistError, StateStore};
use crate::module::publisher::Publisher;

/// In-memory state store that records what was saved
#[derive(Default)]
pub struct MemoryStateStore {
    saved: Mutex<Option<SeenState>>,
    saves: AtomicUsize,
    fail: bool,
}

impl MemoryStateStore {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn saved(&self) -> Option<SeenState> {
        self.saved.lock().unwrap().clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn load(&self) -> Result<SeenState, StatePersistError> {
        Ok(self.saved().unwrap_or_default())
    }

    async fn save(&self, state: &SeenState) -> Result<(), StatePersistError> {
        if self.fail {
            return Err(StatePersistError::Io {
                path: "memory".into(),
                source: std::io::Error::other("disk full"),
            });
        }
        *self.saved.lock().unwrap() = Some(state.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Feed source serving canned records; feeds without records fail
#[derive(Default)]
pub struct FakeFeedSource {
    feeds: Mutex<HashMap<FeedKind, Vec<RawRecord>>>,
    fetches: AtomicUsize,
}

impl FakeFeedSource {
    pub fn set(&self, kind: FeedKind, records: Vec<RawRecord>) {
        self.feeds.lock().unwrap().insert(kind, records);
    }

    pub fn fail(&self, kind: FeedKind) {
        self.feeds.lock().unwrap().remove(&kind);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedSource for FakeFeedSource {
    async fn fetch(&self, kind: FeedKind) -> Result<Vec<RawRecord>, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.feeds
            .lock()
            .unwrap()
            .get(&kind)
            .cloned()
            .ok_or(FetchError::Status {
                feed: kind,
                status: StatusCode::SERVICE_UNAVAILABLE,
            })
    }
}

/// Publisher that keeps every posted text
#[derive(Default)]
pub struct RecordingPublisher {
    posts: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingPublisher {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn posts(&self) -> Vec<String> {
        self.posts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn post(&self, text: &str) -> anyhow::Result<()> {
        if self.fail {
            anyhow::bail!("channel unavailable");
        }
        self.posts.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

pub fn window(id: &str, hail_start: DateTime<Utc>, hail_end: DateTime<Utc>) -> UplinkWindow {
    UplinkWindow {
        id: id.to_string(),
        orbiter: "MRO".to_string(),
        lander: "M20".to_string(),
        pass_start: Some(hail_start - Duration::minutes(5)),
        pass_end: Some(hail_end + Duration::minutes(5)),
        hail_start: Some(hail_start),
        hail_end: Some(hail_end),
        link_type: LinkType::Return,
        request_forward_rate: Some(8),
        request_return_rate: Some(2048),
        request_volume_returned: Some(1200.0),
        request_adr: false,
    }
}

pub fn downlink(id: &str, start_time: DateTime<Utc>, bits: i64) -> Downlink {
    Downlink {
        id: id.to_string(),
        overflight_id: id.to_string(),
        orbiter: "ODY".to_string(),
        lander: "MSL".to_string(),
        start_time,
        end_time: start_time + Duration::minutes(10),
        bits: Some(bits),
    }
}
