//! Perpetual-futures kline backfill.
//!
//! * [`models`] holds the canonical [`Candle`](models::candle::Candle), timeframes and the
//!   on-disk line format.
//! * [`providers`] fetches candles from a remote API behind the
//!   [`KlineProvider`](providers::KlineProvider) trait.
//! * [`io`] persists candles in month-partitioned JSON-lines files behind the
//!   [`KlineStore`](io::store::KlineStore) trait.

pub mod io;
pub mod models;
pub mod providers;
