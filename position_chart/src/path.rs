//! Symbol and timeframe from the trade log's location.
//!
//! The trade monitor writes its logs under a `<SYMBOL>_<timeframe>` directory, e.g.
//! `temp/BTCUSDT_4h/trades.json`. Only directory components are inspected; the file
//! name itself is ignored.

use std::path::{Component, Path};

use kline_ingestor::models::timeframe::Timeframe;
use snafu::ResultExt;

use crate::errors::{ConfigError, TimeframeSnafu, TradesPathSnafu};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradesPathInfo {
    /// Upper-cased pair, e.g. `BTCUSDT`.
    pub symbol: String,
    pub timeframe: Timeframe,
}

/// Splits `component` at its last `_` followed by an ASCII alphanumeric.
///
/// Returns the symbol and the alphanumeric run after the split.
fn split_component(component: &str) -> Option<(&str, &str)> {
    let bytes = component.as_bytes();
    let split = (1..bytes.len())
        .rev()
        .find(|&i| bytes[i - 1] == b'_' && bytes[i].is_ascii_alphanumeric())?;

    let symbol = &component[..split - 1];
    if symbol.is_empty() {
        return None;
    }
    let run = bytes[split..]
        .iter()
        .take_while(|b| b.is_ascii_alphanumeric())
        .count();
    Some((symbol, &component[split..split + run]))
}

/// Finds the `<symbol>_<timeframe>` directory nearest to the file.
///
/// Precedence: components are tried from the file's parent upward, and the first one whose
/// token parses as a timeframe wins. `BTCUSDT_1h/ETHUSDT_4h/trades.json` therefore yields
/// `ETHUSDT` and `4h`.
///
/// Components whose token is not a timeframe are passed over; if some component had the
/// right shape but no token parsed, the nearest parse failure is reported.
pub fn parse_trades_path(path: &Path) -> Result<TradesPathInfo, ConfigError> {
    let dir = path.parent().unwrap_or(Path::new(""));
    let mut rejected = None;

    for name in dir.components().rev().filter_map(|c| match c {
        Component::Normal(name) => name.to_str(),
        _ => None,
    }) {
        let Some((symbol, token)) = split_component(name) else {
            continue;
        };
        match token.parse::<Timeframe>() {
            Ok(timeframe) => {
                return Ok(TradesPathInfo {
                    symbol: symbol.to_uppercase(),
                    timeframe,
                });
            }
            Err(e) => {
                rejected.get_or_insert(e);
            }
        }
    }

    match rejected {
        Some(source) => Err(source).context(TimeframeSnafu { path }),
        None => TradesPathSnafu { path }.fail(),
    }
}
