//! Canonical in-memory representation of one perpetual-futures kline.
//!
//! Every [`KlineProvider`](crate::providers::KlineProvider) returns these and the
//! [`KlineStore`](crate::io::store::KlineStore) persists them, so the rest of the
//! pipeline never sees exchange- or file-specific shapes.

use chrono::{DateTime, TimeZone, Utc};

/// A single OHLCV candle, keyed by its open time.
#[derive(Debug, Clone, PartialEq)]
pub struct Candle {
    /// Open time in milliseconds since the Unix epoch.
    pub start_time: i64,

    /// Close time in milliseconds since the Unix epoch (last millisecond of the bucket).
    pub end_time: i64,

    /// Interval token, e.g. `"15m"`.
    pub interval: String,

    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,

    /// Base asset volume.
    pub volume: f64,

    /// Quote asset volume.
    pub quote_volume: f64,

    pub trade_count: u64,
    pub taker_buy_base_volume: f64,
    pub taker_buy_quote_volume: f64,
}

impl Candle {
    /// Open time as a UTC instant. `None` when the millisecond value is out of chrono's range.
    pub fn open_time(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.start_time).single()
    }

    /// Whether every price and volume field is a finite number.
    pub fn is_finite(&self) -> bool {
        [self.open, self.high, self.low, self.close, self.volume]
            .iter()
            .all(|v| v.is_finite())
    }
}
