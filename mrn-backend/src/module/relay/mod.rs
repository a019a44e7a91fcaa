///! Mars Relay Network alerting
///!
///! Polls the relay feeds, works out which uplink sessions and downlinks
///! just became active and announces each one exactly once.
///!
///! ## Main Components
///! - `HttpFeedSource`: fetches raw feed records
///! - `relevant_events`: orbiter events in effect during a transfer
///! - `DedupTracker`: restart-safe "already announced" bookkeeping
///! - `RelayUpdater`: one poll tick (refresh, filter, render, publish)

// ============ Feed Access ============
mod feed;
pub use feed::{FeedSource, FetchError, HttpFeedSource};

mod parser;
pub use parser::{parse_feed, ParsedFeed};

// ============ Correlation ============
mod correlator;
pub use correlator::relevant_events;

// ============ Deduplication ============
mod state;
pub use state::{JsonFileStateStore, SeenMap, SeenState, StatePersistError, StateStore};

mod dedup;
pub use dedup::{AnnounceKind, Announceable, DedupTracker, DEFAULT_RETENTION_DAYS};

// ============ Rendering ============
mod names;
pub use names::{format_receiver, lander_name, orbiter_name};

mod renderer;
pub use renderer::{format_data_rate, format_downlink, format_window, MIN_DOWNLINK_BITS};

// ============ Updater ============
mod updater;
pub use updater::{FeedOutcome, PollState, RefreshReport, RelayUpdater, TickReport};

#[cfg(test)]
pub(crate) mod test_support;
