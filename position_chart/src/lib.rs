//! Cumulative position chart for a perpetual-futures pair.
//!
//! Given a trade log stored under `<SYMBOL>_<timeframe>/`, a run works out the monitored
//! window, backfills any 15-minute candles missing from the local store, and draws the
//! candles with the cumulative signed trade quantity on top. See [`pipeline::run`].

pub mod bucket;
pub mod config;
pub mod errors;
pub mod gaps;
pub mod path;
pub mod pipeline;
pub mod render;
pub mod series;
pub mod trades;
