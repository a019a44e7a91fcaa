///! Feed record parser
///!
///! Normalizes a fetched feed into entities, logging and counting the
///! records that had to be skipped.

use mrn_common::{normalize_batch, FromRecord, RawRecord};

/// Entities parsed from one feed, plus how many records were dropped
#[derive(Debug, Clone)]
pub struct ParsedFeed<T> {
    pub entities: Vec<T>,
    pub skipped: usize,
}

/// Parse every record of a feed; malformed records are skipped with a warning.
pub fn parse_feed<T: FromRecord>(records: &[RawRecord]) -> ParsedFeed<T> {
    let batch = normalize_batch::<T>(records);

    for rejected in &batch.rejected {
        tracing::warn!("Skipping malformed {} record {}", T::FEED, rejected);
    }

    ParsedFeed {
        entities: batch.entities,
        skipped: batch.rejected.len(),
    }
}
