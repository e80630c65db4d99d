use serde::Deserialize;
use serde_json::Value;

use crate::models::{candle::Candle, kline_record::decimal_str};

/// One row of the `continuousKlines` response:
/// `[openTime, open, high, low, close, volume, closeTime, quoteVolume, tradeCount,
/// takerBuyBaseVolume, takerBuyQuoteVolume, ignore]`.
#[derive(Deserialize, Debug, Clone)]
pub struct FetchedKline(
    pub i64,
    #[serde(deserialize_with = "decimal_str::deserialize")] pub f64,
    #[serde(deserialize_with = "decimal_str::deserialize")] pub f64,
    #[serde(deserialize_with = "decimal_str::deserialize")] pub f64,
    #[serde(deserialize_with = "decimal_str::deserialize")] pub f64,
    #[serde(deserialize_with = "decimal_str::deserialize")] pub f64,
    pub i64,
    #[serde(deserialize_with = "decimal_str::deserialize")] pub f64,
    pub u64,
    #[serde(deserialize_with = "decimal_str::deserialize")] pub f64,
    #[serde(deserialize_with = "decimal_str::deserialize")] pub f64,
    pub Value,
);

impl FetchedKline {
    pub fn into_candle(self, interval: &str) -> Candle {
        let FetchedKline(
            start_time,
            open,
            high,
            low,
            close,
            volume,
            end_time,
            quote_volume,
            trade_count,
            taker_buy_base_volume,
            taker_buy_quote_volume,
            _ignore,
        ) = self;

        Candle {
            start_time,
            end_time,
            interval: interval.to_string(),
            open,
            high,
            low,
            close,
            volume,
            quote_volume,
            trade_count,
            taker_buy_base_volume,
            taker_buy_quote_volume,
        }
    }
}
