//! bucket.rs: UTC alignment of the monitored window
//!
//! - Stored candles are 15-minute buckets aligned on the epoch.
//! - A monitored timeframe (`4h`, `1d`, ...) defines how far back the window reaches.
//! - `now` is always passed in; nothing here reads the clock.
//!
//! All functions assume UTC.

use chrono::{DateTime, Duration, Timelike, Utc};
use kline_ingestor::models::{
    timeframe::Timeframe,
    year_month::{YearMonth, months_between},
};
use snafu::OptionExt;

use crate::errors::{ConfigError, WindowRangeSnafu};

/// Width of a stored candle, in minutes.
pub const STORE_STEP_MINUTES: i64 = 15;
/// Width of a stored candle, in milliseconds.
pub const STORE_STEP_MS: i64 = STORE_STEP_MINUTES * 60 * 1000;

/// Drops seconds and sub-seconds, then floors the minute-of-hour to a multiple of
/// `step_minutes`. Steps of 60 or more land on the top of the hour.
///
/// Idempotent: `floor_to_step(floor_to_step(t, s), s) == floor_to_step(t, s)`.
pub fn floor_to_step(t: DateTime<Utc>, step_minutes: i64) -> DateTime<Utc> {
    t - floor_offset(t, step_minutes)
}

/// Distance from `t` back to `floor_to_step(t, step_minutes)`; always under an hour.
fn floor_offset(t: DateTime<Utc>, step_minutes: i64) -> Duration {
    let step = step_minutes.max(1);
    Duration::seconds(i64::from(t.second()))
        + Duration::nanoseconds(i64::from(t.nanosecond()))
        + Duration::minutes(i64::from(t.minute()) % step)
}

/// The latest bucket boundary whose bucket has closed: `floor_to_step(now) - step`.
pub fn aligned_floor(now: DateTime<Utc>, step_minutes: i64) -> DateTime<Utc> {
    floor_to_step(now, step_minutes) - Duration::minutes(step_minutes.max(1))
}

/// Start of the monitored window: one timeframe back from `now`, floored to the timeframe.
///
/// `None` when that instant falls outside the representable date range.
pub fn expected_start(now: DateTime<Utc>, timeframe: Timeframe) -> Option<DateTime<Utc>> {
    let back = now.checked_sub_signed(timeframe.duration())?;
    back.checked_sub_signed(floor_offset(back, timeframe.minutes()))
}

/// Epoch-aligned start of the stored bucket containing `ms`.
pub fn store_bucket_ms(ms: i64) -> i64 {
    ms - ms.rem_euclid(STORE_STEP_MS)
}

/// Window of stored candles a run expects, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitoredWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl MonitoredWindow {
    pub fn new(now: DateTime<Utc>, timeframe: Timeframe) -> Result<Self, ConfigError> {
        let start = expected_start(now, timeframe).context(WindowRangeSnafu { timeframe })?;
        Ok(Self {
            start,
            end: aligned_floor(now, STORE_STEP_MINUTES),
        })
    }

    /// Month partitions the window touches.
    pub fn months(&self) -> Vec<YearMonth> {
        months_between(self.start, self.end)
    }
}
