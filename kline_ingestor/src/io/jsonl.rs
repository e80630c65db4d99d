//! Month-partitioned, line-delimited JSON kline files.
//!
//! Layout: `<root>/<symbol lower>_15m_<yyyymm>.json`, one [`KlineEnvelope`] per line.

use std::{
    collections::HashSet,
    fs::{self, OpenOptions},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use indexmap::IndexMap;
use snafu::{OptionExt, ResultExt};
use tracing::{debug, warn};

use crate::{
    io::store::{
        AppendSummary, EncodeSnafu, IoSnafu, KlineStore, MonthAppend, OutOfRangeSnafu,
        LineOutcome, SinkError, StoreScan, classify_line,
    },
    models::{candle::Candle, kline_record::KlineEnvelope, year_month::YearMonth},
};

pub const DEFAULT_DATA_DIR: &str = "data/kline_data";

/// Granularity every stored file holds.
pub const STORE_INTERVAL: &str = "15m";

#[derive(Debug, Clone)]
pub struct JsonlKlineStore {
    root: PathBuf,
}

impl JsonlKlineStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn month_path(&self, symbol: &str, month: YearMonth) -> PathBuf {
        self.root.join(format!(
            "{}_{}_{}.json",
            symbol.to_lowercase(),
            STORE_INTERVAL,
            month
        ))
    }

    /// Reads a month file as raw bytes, `None` when it does not exist.
    fn read_month(path: &Path) -> Result<Option<Vec<u8>>, SinkError> {
        match fs::read(path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).context(IoSnafu { path }),
        }
    }

    /// Classifies every line; a line that is not UTF-8 counts as skipped.
    fn scan_content(content: &[u8], scan: &mut StoreScan) {
        for line in content.split(|&b| b == b'\n') {
            let outcome = match std::str::from_utf8(line) {
                Ok(text) => classify_line(text),
                Err(e) => LineOutcome::Skipped {
                    reason: e.to_string(),
                },
            };
            scan.absorb(outcome);
        }
    }
}

impl Default for JsonlKlineStore {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_DIR)
    }
}

impl KlineStore for JsonlKlineStore {
    fn load(&self, symbol: &str, months: &[YearMonth]) -> Result<StoreScan, SinkError> {
        let mut scan = StoreScan::default();

        for &month in months {
            let path = self.month_path(symbol, month);
            match Self::read_month(&path)? {
                Some(content) => {
                    let before = scan.len();
                    Self::scan_content(&content, &mut scan);
                    debug!(path = %path.display(), rows = scan.len() - before, "loaded kline file");
                }
                None => {
                    warn!(path = %path.display(), "kline file not found");
                    scan.missing_months.push(month);
                }
            }
        }

        if scan.skipped > 0 {
            warn!(skipped = scan.skipped, "skipped malformed kline lines");
        }
        Ok(scan)
    }

    fn append(&self, symbol: &str, candles: &[Candle]) -> Result<AppendSummary, SinkError> {
        let mut groups: IndexMap<YearMonth, Vec<&Candle>> = IndexMap::new();
        for candle in candles {
            let month = YearMonth::from_millis(candle.start_time).context(OutOfRangeSnafu {
                start_time: candle.start_time,
            })?;
            groups.entry(month).or_default().push(candle);
        }

        let mut summary = AppendSummary::default();
        if groups.is_empty() {
            return Ok(summary);
        }
        fs::create_dir_all(&self.root).context(IoSnafu { path: &self.root })?;

        let pair = symbol.to_uppercase();
        for (month, batch) in groups {
            let path = self.month_path(symbol, month);

            let mut existing = StoreScan::default();
            let mut buf = String::new();
            if let Some(content) = Self::read_month(&path)? {
                Self::scan_content(&content, &mut existing);
                // a torn last line must not swallow the first appended record
                if content.last().is_some_and(|&b| b != b'\n') {
                    buf.push('\n');
                }
            }
            let mut seen: HashSet<i64> = existing.candles.keys().copied().collect();

            let mut appended = 0;
            let mut duplicates = 0;
            for candle in batch {
                if !seen.insert(candle.start_time) {
                    duplicates += 1;
                    continue;
                }
                let line = serde_json::to_string(&KlineEnvelope::backfilled(&pair, candle))
                    .context(EncodeSnafu {
                        start_time: candle.start_time,
                    })?;
                buf.push_str(&line);
                buf.push('\n');
                appended += 1;
            }

            if appended > 0 {
                let mut file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)
                    .context(IoSnafu { path: &path })?;
                file.write_all(buf.as_bytes())
                    .context(IoSnafu { path: &path })?;
            }

            debug!(path = %path.display(), appended, duplicates, "appended klines");
            summary.months.push(MonthAppend {
                month,
                appended,
                duplicates,
            });
        }

        Ok(summary)
    }
}
