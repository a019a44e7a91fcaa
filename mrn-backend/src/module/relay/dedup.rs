///! Announcement deduplication
///!
///! Remembers which windows and downlinks were already announced so a
///! re-poll, or a restart, never announces them twice. Records older than
///! the retention horizon are forgotten.

use chrono::{DateTime, Duration, Utc};
use mrn_common::{Downlink, UplinkWindow};
use std::sync::Arc;

use super::state::{SeenMap, SeenState, StatePersistError, StateStore};

/// How long an announcement is remembered by default
pub const DEFAULT_RETENTION_DAYS: i64 = 7;

/// Which dedup record an entity belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnounceKind {
    Window,
    Downlink,
}

/// An entity the bot announces at most once
pub trait Announceable {
    const KIND: AnnounceKind;

    fn announce_id(&self) -> &str;

    /// Timestamp the retention horizon is measured from
    fn announce_key(&self) -> Option<DateTime<Utc>>;
}

impl Announceable for UplinkWindow {
    const KIND: AnnounceKind = AnnounceKind::Window;

    fn announce_id(&self) -> &str {
        &self.id
    }

    fn announce_key(&self) -> Option<DateTime<Utc>> {
        self.hail_start
    }
}

impl Announceable for Downlink {
    const KIND: AnnounceKind = AnnounceKind::Downlink;

    fn announce_id(&self) -> &str {
        &self.id
    }

    fn announce_key(&self) -> Option<DateTime<Utc>> {
        Some(self.start_time)
    }
}

/// Tracks announced entities and persists every new announcement
pub struct DedupTracker {
    state: SeenState,
    store: Arc<dyn StateStore>,
    retention: Duration,
}

impl DedupTracker {
    /// Load the persisted state from `store`
    pub async fn load(store: Arc<dyn StateStore>, retention: Duration) -> Result<Self, StatePersistError> {
        let state = store.load().await?;
        Ok(Self::with_state(state, store, retention))
    }

    pub fn with_state(state: SeenState, store: Arc<dyn StateStore>, retention: Duration) -> Self {
        Self {
            state,
            store,
            retention,
        }
    }

    pub fn state(&self) -> &SeenState {
        &self.state
    }

    fn seen_mut(&mut self, kind: AnnounceKind) -> &mut SeenMap {
        match kind {
            AnnounceKind::Window => &mut self.state.windows,
            AnnounceKind::Downlink => &mut self.state.downlinks,
        }
    }

    /// True unless `entity` was announced within the retention horizon.
    ///
    /// Prunes expired records of the entity's kind first.
    pub fn should_announce<T: Announceable>(&mut self, entity: &T, now: DateTime<Utc>) -> bool {
        let cutoff = now - self.retention;
        let seen = self.seen_mut(T::KIND);

        let pruned = seen.prune_before(cutoff);
        if pruned > 0 {
            tracing::debug!("Pruned {} expired {:?} records", pruned, T::KIND);
        }

        !seen.contains_id(entity.announce_id())
    }

    /// Record `entity` as announced and persist immediately.
    ///
    /// On a persist failure the record is still kept in memory and goes out
    /// with the next successful save.
    pub async fn mark_announced<T: Announceable>(
        &mut self,
        entity: &T,
        now: DateTime<Utc>,
    ) -> Result<(), StatePersistError> {
        let key = entity.announce_key().unwrap_or(now);
        self.seen_mut(T::KIND).insert(key, entity.announce_id());
        self.store.save(&self.state).await
    }
}
