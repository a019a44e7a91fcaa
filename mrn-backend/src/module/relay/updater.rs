///! Relay updater
///!
///! Owns the loaded feed entities and runs one poll tick at a time:
///! refresh the feeds when they are stale, then announce every window and
///! downlink that just became active and has not been announced yet.

use chrono::{DateTime, Duration, Utc};
use mrn_common::{Downlink, FeedKind, FromRecord, OrbiterEvent, RawRecord, UplinkWindow};
use std::collections::HashMap;
use std::sync::Arc;

use super::correlator::relevant_events;
use super::dedup::{AnnounceKind, Announceable, DedupTracker};
use super::feed::{FeedSource, FetchError};
use super::parser::parse_feed;
use super::renderer::{format_downlink, format_window};
use crate::module::publisher::Publisher;

/// Failed posts tolerated per entity before it is marked anyway
const MAX_PUBLISH_ATTEMPTS: u32 = 3;

/// Entities currently loaded from the feeds
#[derive(Debug, Clone, Default)]
pub struct PollState {
    /// When the feeds were last refreshed (successfully or not)
    pub last_refresh: Option<DateTime<Utc>>,
    pub windows: Vec<UplinkWindow>,
    pub downlinks: Vec<Downlink>,
    pub events: Vec<OrbiterEvent>,
}

/// Outcome of refreshing one feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedOutcome {
    Loaded { entities: usize, skipped: usize },
    /// Fetch failed; the previous entities were kept
    Failed { kept: usize },
}

/// Outcome of refreshing all feeds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshReport {
    pub feeds: Vec<(FeedKind, FeedOutcome)>,
}

impl RefreshReport {
    pub fn failed_feeds(&self) -> usize {
        self.feeds
            .iter()
            .filter(|(_, outcome)| matches!(outcome, FeedOutcome::Failed { .. }))
            .count()
    }
}

/// What one tick did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub refresh: Option<RefreshReport>,
    pub windows_announced: usize,
    pub downlinks_announced: usize,
    /// Downlinks marked announced without posting (too small)
    pub downlinks_suppressed: usize,
    pub publish_failures: usize,
    /// Entities marked announced after too many failed publishes
    pub publish_abandoned: usize,
}

pub struct RelayUpdater {
    feeds: Arc<dyn FeedSource>,
    publisher: Arc<dyn Publisher>,
    tracker: DedupTracker,
    refresh_interval: Duration,
    state: PollState,
    publish_attempts: HashMap<(AnnounceKind, String), u32>,
}

impl RelayUpdater {
    pub fn new(
        feeds: Arc<dyn FeedSource>,
        publisher: Arc<dyn Publisher>,
        tracker: DedupTracker,
        refresh_interval: Duration,
    ) -> Self {
        Self {
            feeds,
            publisher,
            tracker,
            refresh_interval,
            state: PollState::default(),
            publish_attempts: HashMap::new(),
        }
    }

    pub fn state(&self) -> &PollState {
        &self.state
    }

    pub fn tracker(&self) -> &DedupTracker {
        &self.tracker
    }

    /// True before the first refresh and once the last one is older than
    /// the refresh interval
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        match self.state.last_refresh {
            None => true,
            Some(last) => now - last > self.refresh_interval,
        }
    }

    /// Fetch all three feeds and replace what loaded successfully.
    ///
    /// A feed that fails keeps its previous entities.
    pub async fn refresh(&mut self, now: DateTime<Utc>) -> RefreshReport {
        tracing::debug!("Refreshing relay feeds");

        let (windows, downlinks, events) = futures::join!(
            self.feeds.fetch(FeedKind::UplinkWindows),
            self.feeds.fetch(FeedKind::Downlinks),
            self.feeds.fetch(FeedKind::OrbiterEvents),
        );

        let report = RefreshReport {
            feeds: vec![
                (FeedKind::UplinkWindows, apply_feed(&mut self.state.windows, windows)),
                (FeedKind::Downlinks, apply_feed(&mut self.state.downlinks, downlinks)),
                (FeedKind::OrbiterEvents, apply_feed(&mut self.state.events, events)),
            ],
        };
        self.state.last_refresh = Some(now);

        tracing::info!(
            "Relay feeds refreshed: {} windows, {} downlinks, {} orbiter events ({} feeds failed)",
            self.state.windows.len(),
            self.state.downlinks.len(),
            self.state.events.len(),
            report.failed_feeds()
        );

        report
    }

    /// Run one poll tick at `now`
    pub async fn tick(&mut self, now: DateTime<Utc>) -> TickReport {
        let mut report = TickReport::default();

        if self.needs_refresh(now) {
            report.refresh = Some(self.refresh(now).await);
        }

        self.announce_windows(now, &mut report).await;
        self.announce_downlinks(now, &mut report).await;

        report
    }

    async fn announce_windows(&mut self, now: DateTime<Utc>, report: &mut TickReport) {
        let active: Vec<UplinkWindow> = self
            .state
            .windows
            .iter()
            .filter(|w| w.link_type.is_scheduled() && w.is_hailing(now))
            .cloned()
            .collect();

        for window in active {
            if !self.tracker.should_announce(&window, now) {
                continue;
            }

            let text = format_window(&window);
            match self.publish(&window, &text, report).await {
                PublishOutcome::Delivered => {
                    tracing::info!("Announced window {}", window.id);
                    report.windows_announced += 1;
                }
                PublishOutcome::Retry => continue,
                PublishOutcome::GaveUp => {}
            }

            if let Err(e) = self.tracker.mark_announced(&window, now).await {
                tracing::error!("Failed to persist announcement of window {}: {}", window.id, e);
            }
        }
    }

    async fn announce_downlinks(&mut self, now: DateTime<Utc>, report: &mut TickReport) {
        let active: Vec<Downlink> = self
            .state
            .downlinks
            .iter()
            .filter(|d| d.is_active(now))
            .cloned()
            .collect();

        for downlink in active {
            if !self.tracker.should_announce(&downlink, now) {
                continue;
            }

            let events = relevant_events(&self.state.events, &downlink.orbiter, downlink.start_time);
            match format_downlink(&downlink, &events) {
                Some(text) => match self.publish(&downlink, &text, report).await {
                    PublishOutcome::Delivered => {
                        tracing::info!("Announced downlink {}", downlink.id);
                        report.downlinks_announced += 1;
                    }
                    PublishOutcome::Retry => continue,
                    PublishOutcome::GaveUp => {}
                },
                None => {
                    tracing::debug!(
                        "Downlink {} below announcement threshold ({:?} bits)",
                        downlink.id,
                        downlink.bits
                    );
                    report.downlinks_suppressed += 1;
                }
            }

            if let Err(e) = self.tracker.mark_announced(&downlink, now).await {
                tracing::error!("Failed to persist announcement of downlink {}: {}", downlink.id, e);
            }
        }
    }

    /// Post `text` for `entity`, counting failed attempts per entity.
    ///
    /// After [`MAX_PUBLISH_ATTEMPTS`] failures the entity is given up on, so
    /// an endpoint that fails after delivering does not repeat it every tick.
    async fn publish<T: Announceable>(&mut self, entity: &T, text: &str, report: &mut TickReport) -> PublishOutcome {
        let key = (T::KIND, entity.announce_id().to_string());

        let error = match self.publisher.post(text).await {
            Ok(()) => {
                self.publish_attempts.remove(&key);
                return PublishOutcome::Delivered;
            }
            Err(e) => e,
        };

        report.publish_failures += 1;
        let attempts = {
            let count = self.publish_attempts.entry(key.clone()).or_insert(0);
            *count += 1;
            *count
        };

        if attempts >= MAX_PUBLISH_ATTEMPTS {
            tracing::error!(
                "Giving up on {:?} {} after {} failed publish attempts: {:#}",
                T::KIND,
                key.1,
                attempts,
                error
            );
            self.publish_attempts.remove(&key);
            report.publish_abandoned += 1;
            PublishOutcome::GaveUp
        } else {
            tracing::error!(
                "Failed to publish {:?} {} (attempt {}/{}): {:#}",
                T::KIND,
                key.1,
                attempts,
                MAX_PUBLISH_ATTEMPTS,
                error
            );
            PublishOutcome::Retry
        }
    }
}

enum PublishOutcome {
    Delivered,
    /// Not marked; tried again on the next tick
    Retry,
    /// Marked without having been delivered
    GaveUp,
}

/// Replace `slot` with the parsed feed, or keep it when the fetch failed
fn apply_feed<T: FromRecord>(slot: &mut Vec<T>, fetched: Result<Vec<RawRecord>, FetchError>) -> FeedOutcome {
    match fetched {
        Ok(records) => {
            let parsed = parse_feed::<T>(&records);
            let outcome = FeedOutcome::Loaded {
                entities: parsed.entities.len(),
                skipped: parsed.skipped,
            };
            *slot = parsed.entities;
            outcome
        }
        Err(e) => {
            tracing::warn!("Error reading {} data feed, keeping {} cached entries: {}", T::FEED, slot.len(), e);
            FeedOutcome::Failed { kept: slot.len() }
        }
    }
}
