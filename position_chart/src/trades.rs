//! Trade log written by the trade monitor.
//!
//! The log is a single JSON array. Only `event_time`, `quantity` and `is_buyer_maker` are
//! read; everything else on a record (price, ids, symbol) is ignored.

use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use kline_ingestor::models::kline_record::decimal_str;
use serde::Deserialize;
use snafu::{Backtrace, ResultExt, Snafu};
use tracing::debug;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum TradeLogError {
    #[snafu(display("Failed to open trade log {}: {source}", path.display()))]
    Open {
        path: PathBuf,
        source: std::io::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("Failed to decode trade log {}: {source}", path.display()))]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
        backtrace: Backtrace,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TradeRecord {
    /// Exchange event time, ms since the Unix epoch.
    pub event_time: i64,
    #[serde(deserialize_with = "decimal_str::deserialize")]
    pub quantity: f64,
    /// `true` when the buyer was the passive side, i.e. the aggressor sold.
    pub is_buyer_maker: bool,
}

impl TradeRecord {
    /// Negative for maker-buy (sell-aggressor) trades, positive otherwise.
    pub fn signed_quantity(&self) -> f64 {
        if self.is_buyer_maker {
            -self.quantity
        } else {
            self.quantity
        }
    }
}

pub fn load_trades(path: &Path) -> Result<Vec<TradeRecord>, TradeLogError> {
    let file = File::open(path).context(OpenSnafu { path })?;
    let trades: Vec<TradeRecord> =
        serde_json::from_reader(BufReader::new(file)).context(DecodeSnafu { path })?;
    debug!(path = %path.display(), trades = trades.len(), "loaded trade log");
    Ok(trades)
}
