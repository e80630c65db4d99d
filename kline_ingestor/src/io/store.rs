//! Local kline persistence.
//!
//! [`KlineStore`] is the seam between the backfill pipeline and wherever candles are kept.
//! Reads are lenient: a line that cannot be decoded is reported as
//! [`LineOutcome::Skipped`] and counted, never fatal. Writes are append-only and
//! de-duplicated on `start_time`.

use std::{collections::BTreeMap, path::PathBuf};

use snafu::{Backtrace, Snafu};

use crate::models::{candle::Candle, kline_record::KlineEnvelope, year_month::YearMonth};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SinkError {
    /// Opening, reading or appending to a month file failed.
    #[snafu(display("I/O error on {}: {source}", path.display()))]
    Io {
        path: PathBuf,
        source: std::io::Error,
        backtrace: Backtrace,
    },

    /// A candle could not be encoded as a stored line.
    #[snafu(display("Failed to encode kline {start_time}: {source}"))]
    Encode {
        start_time: i64,
        source: serde_json::Error,
        backtrace: Backtrace,
    },

    /// A candle's open time cannot be mapped to a calendar month.
    #[snafu(display("Kline open time {start_time} is out of range"))]
    OutOfRange {
        start_time: i64,
        backtrace: Backtrace,
    },
}

/// Classification of one stored line.
#[derive(Debug)]
pub enum LineOutcome {
    Record(Box<KlineEnvelope>),
    Blank,
    Skipped { reason: String },
}

/// Decodes one stored line without ever failing.
pub fn classify_line(line: &str) -> LineOutcome {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return LineOutcome::Blank;
    }
    match serde_json::from_str::<KlineEnvelope>(trimmed) {
        Ok(env) => LineOutcome::Record(Box::new(env)),
        Err(e) => LineOutcome::Skipped {
            reason: e.to_string(),
        },
    }
}

/// Result of loading one or more month partitions.
#[derive(Debug, Default, Clone)]
pub struct StoreScan {
    /// Candles keyed by open time; a repeated open time keeps the first line read.
    pub candles: BTreeMap<i64, Candle>,
    /// Lines that could not be decoded.
    pub skipped: usize,
    /// Month partitions that had no file.
    pub missing_months: Vec<YearMonth>,
}

impl StoreScan {
    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// Folds one decoded line into the scan.
    pub fn absorb(&mut self, outcome: LineOutcome) {
        match outcome {
            LineOutcome::Record(env) => {
                let candle = Candle::from(env.kline);
                self.candles.entry(candle.start_time).or_insert(candle);
            }
            LineOutcome::Blank => {}
            LineOutcome::Skipped { .. } => self.skipped += 1,
        }
    }
}

/// Per-partition outcome of an append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthAppend {
    pub month: YearMonth,
    pub appended: usize,
    pub duplicates: usize,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AppendSummary {
    pub months: Vec<MonthAppend>,
}

impl AppendSummary {
    pub fn appended(&self) -> usize {
        self.months.iter().map(|m| m.appended).sum()
    }

    pub fn duplicates(&self) -> usize {
        self.months.iter().map(|m| m.duplicates).sum()
    }
}

pub trait KlineStore {
    /// Loads every candle of `symbol` stored in the given month partitions.
    fn load(&self, symbol: &str, months: &[YearMonth]) -> Result<StoreScan, SinkError>;

    /// Appends candles that are not stored yet, grouped into their month partitions.
    fn append(&self, symbol: &str, candles: &[Candle]) -> Result<AppendSummary, SinkError>;
}
