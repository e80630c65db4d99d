//! Missing stored candles within the monitored window.
//!
//! Detection always walks the 15-minute store grid, whatever the monitored timeframe.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};

use crate::bucket::{MonitoredWindow, STORE_STEP_MINUTES};

/// Outcome of comparing the local index against the expected timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GapReport {
    /// Slots on the expected timeline.
    pub expected: usize,
    /// Slots already stored.
    pub present: usize,
    /// Absent slots, in time order.
    pub missing: Vec<DateTime<Utc>>,
}

impl GapReport {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    /// See [`backfill_range`].
    pub fn backfill_range(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        backfill_range(&self.missing)
    }
}

/// Every 15-minute slot from `start` to `end`, both inclusive. Empty when inverted.
pub fn expected_timeline(start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<DateTime<Utc>> {
    let step = Duration::minutes(STORE_STEP_MINUTES);
    std::iter::successors(Some(start), |t| t.checked_add_signed(step))
        .take_while(|t| *t <= end)
        .collect()
}

/// Lists the window's slots that have no entry in `index` (keyed by open time in ms).
pub fn detect_gaps<V>(index: &BTreeMap<i64, V>, window: MonitoredWindow) -> GapReport {
    let timeline = expected_timeline(window.start, window.end);
    let expected = timeline.len();
    let missing: Vec<DateTime<Utc>> = timeline
        .into_iter()
        .filter(|t| !index.contains_key(&t.timestamp_millis()))
        .collect();

    GapReport {
        expected,
        present: expected - missing.len(),
        missing,
    }
}

/// Half-open fetch range covering every gap: `[first_missing, last_missing + 15m)`.
pub fn backfill_range(missing: &[DateTime<Utc>]) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let first = *missing.first()?;
    let last = *missing.last()?;
    Some((first, last + Duration::minutes(STORE_STEP_MINUTES)))
}
