//! On-disk line format of the monthly kline files.
//!
//! Each line is a [`KlineEnvelope`] wrapping a [`KlineRecord`]. The layout matches the
//! records the live trade monitor appends from the websocket stream, so backfilled rows
//! and streamed rows can share a file.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::candle::Candle;

pub const PERPETUAL: &str = "PERPETUAL";

/// Outer wrapper of one stored line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KlineEnvelope {
    #[serde(default)]
    pub event: String,

    /// Empty string for backfilled rows, the stream's event time for streamed rows.
    #[serde(default)]
    pub event_time: Value,

    #[serde(default)]
    pub pair: String,

    #[serde(default)]
    pub contract_type: String,

    pub kline: KlineRecord,
}

/// The `kline` object of a stored line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KlineRecord {
    pub start_time: i64,
    pub end_time: i64,
    pub interval: String,
    #[serde(default)]
    pub first_trade_id: Option<i64>,
    #[serde(default)]
    pub last_trade_id: Option<i64>,
    #[serde(with = "decimal_str")]
    pub open: f64,
    #[serde(with = "decimal_str")]
    pub close: f64,
    #[serde(with = "decimal_str")]
    pub high: f64,
    #[serde(with = "decimal_str")]
    pub low: f64,
    #[serde(with = "decimal_str")]
    pub volume: f64,
    pub trade_count: u64,
    #[serde(default = "default_is_final")]
    pub is_final: bool,
    #[serde(with = "decimal_str")]
    pub quote_asset_volume: f64,
    #[serde(with = "decimal_str")]
    pub taker_buy_base_volume: f64,
    #[serde(with = "decimal_str")]
    pub taker_buy_quote_volume: f64,
    #[serde(default)]
    pub ignore: Value,
}

fn default_is_final() -> bool {
    true
}

impl KlineEnvelope {
    /// Wraps a REST-sourced candle the way backfilled lines are written.
    pub fn backfilled(pair: &str, candle: &Candle) -> Self {
        Self {
            event: String::new(),
            event_time: Value::String(String::new()),
            pair: pair.to_string(),
            contract_type: PERPETUAL.to_string(),
            kline: KlineRecord {
                start_time: candle.start_time,
                end_time: candle.end_time,
                interval: candle.interval.clone(),
                first_trade_id: None,
                last_trade_id: None,
                open: candle.open,
                close: candle.close,
                high: candle.high,
                low: candle.low,
                volume: candle.volume,
                trade_count: candle.trade_count,
                is_final: true,
                quote_asset_volume: candle.quote_volume,
                taker_buy_base_volume: candle.taker_buy_base_volume,
                taker_buy_quote_volume: candle.taker_buy_quote_volume,
                ignore: Value::String("0".into()),
            },
        }
    }
}

impl From<KlineRecord> for Candle {
    fn from(k: KlineRecord) -> Self {
        Candle {
            start_time: k.start_time,
            end_time: k.end_time,
            interval: k.interval,
            open: k.open,
            high: k.high,
            low: k.low,
            close: k.close,
            volume: k.volume,
            quote_volume: k.quote_asset_volume,
            trade_count: k.trade_count,
            taker_buy_base_volume: k.taker_buy_base_volume,
            taker_buy_quote_volume: k.taker_buy_quote_volume,
        }
    }
}

/// Serde adapter for exchange decimals: written as strings, read from strings or numbers.
pub mod decimal_str {
    use std::fmt;

    use serde::{Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        deserializer.deserialize_any(DecimalVisitor)
    }

    struct DecimalVisitor;

    impl de::Visitor<'_> for DecimalVisitor {
        type Value = f64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a number or a numeric string")
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
            v.trim()
                .parse::<f64>()
                .map_err(|e| E::custom(format!("invalid decimal {v:?}: {e}")))
        }
    }
}
