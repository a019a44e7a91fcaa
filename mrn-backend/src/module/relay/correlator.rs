///! Orbiter event correlation
///!
///! Picks the orbiter events relevant to a transfer happening at a given
///! instant: every interval event (ground station tracks and the like) in
///! effect, plus the latest data rate reading.

use chrono::{DateTime, Utc};
use mrn_common::{OrbiterEvent, OrbiterEventKind};

/// Events of `orbiter` in effect at `at`.
///
/// Interval events come first, sorted by start time; events sharing a start
/// time keep their feed order. At most one `DataRate` event follows: the one
/// with the latest start time, the later in feed order on a tie.
pub fn relevant_events(events: &[OrbiterEvent], orbiter: &str, at: DateTime<Utc>) -> Vec<OrbiterEvent> {
    let mut active: Vec<&OrbiterEvent> = events
        .iter()
        .filter(|e| e.orbiter == orbiter && e.is_active_at(at))
        .collect();
    // Stable sort, so feed order breaks ties
    active.sort_by_key(|e| e.start_time);

    let (rates, mut relevant): (Vec<&OrbiterEvent>, Vec<&OrbiterEvent>) = active
        .into_iter()
        .partition(|e| e.kind == OrbiterEventKind::DataRate);

    if let Some(&latest_rate) = rates.last() {
        relevant.push(latest_rate);
    }

    relevant.into_iter().cloned().collect()
}
