///! Shared domain model for the Mars Relay Network alert bot
///!
///! Typed relay entities, the feed's day-of-year date codec and the record
///! normalizer. Nothing in this crate performs I/O.

pub mod date;
pub mod error;
pub mod normalize;
pub mod record;
pub mod types;

pub use error::{NormalizeError, RecordError};
pub use normalize::{normalize, normalize_batch, FromRecord, NormalizedBatch};
pub use record::RawRecord;
pub use types::{
    Downlink, Entity, FeedKind, LinkType, OrbiterEvent, OrbiterEventKind, UplinkWindow,
};
