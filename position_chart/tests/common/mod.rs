#![allow(dead_code)]

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use kline_ingestor::{
    models::{candle::Candle, request_params::KlinesRequestParams},
    providers::{ApiSnafu, KlineProvider, ProviderError},
};
use tempfile::TempDir;

pub const STEP_MS: i64 = 15 * 60 * 1000;

pub fn june_first(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, hour, minute, 0).unwrap()
}

pub fn candle_at(start_time: i64) -> Candle {
    let drift = (start_time / STEP_MS % 7) as f64;
    Candle {
        start_time,
        end_time: start_time + STEP_MS - 1,
        interval: "15m".into(),
        open: 67_500.0 + drift,
        high: 67_560.0 + drift,
        low: 67_450.0 + drift,
        close: 67_520.0 - drift,
        volume: 120.0 + drift,
        quote_volume: 8_100_000.0,
        trade_count: 900,
        taker_buy_base_volume: 60.0,
        taker_buy_quote_volume: 4_050_000.0,
    }
}

/// Candles for `[from, to)` on the 15-minute grid.
pub fn candles_between(from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<Candle> {
    (from.timestamp_millis()..to.timestamp_millis())
        .step_by(STEP_MS as usize)
        .map(candle_at)
        .collect()
}

/// Exchange stand-in: serves open times in `[start, end]` (both inclusive, like the real
/// endpoint) and drops the trailing candle, as the REST provider does.
#[derive(Default)]
pub struct FakeExchange {
    pub requests: Mutex<Vec<KlinesRequestParams>>,
    pub fail_with_status: Option<u16>,
}

impl FakeExchange {
    pub fn failing(status: u16) -> Self {
        Self {
            fail_with_status: Some(status),
            ..Default::default()
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl KlineProvider for FakeExchange {
    async fn fetch_klines(&self, params: KlinesRequestParams) -> Result<Vec<Candle>, ProviderError> {
        let start = params.start.timestamp_millis();
        let end = params.end.timestamp_millis();
        self.requests.lock().unwrap().push(params);

        if let Some(status) = self.fail_with_status {
            return ApiSnafu {
                status,
                message: "upstream unavailable",
            }
            .fail();
        }

        let mut rows: Vec<Candle> = (start..=end)
            .step_by(STEP_MS as usize)
            .map(candle_at)
            .collect();
        rows.pop();
        Ok(rows)
    }
}

/// Temporary layout: `<tmp>/data` for klines, `<tmp>/temp/<dir>/trades.json` for trades.
pub struct Workspace {
    _dir: TempDir, // keep alive for the life of the test
    pub data_dir: PathBuf,
    pub trades_path: PathBuf,
    pub output_path: PathBuf,
}

pub fn workspace(trade_dir: &str) -> Workspace {
    let dir = TempDir::new().expect("tempdir");
    let data_dir = dir.path().join("data");
    let trades_path = dir.path().join("temp").join(trade_dir).join("trades.json");
    fs::create_dir_all(trades_path.parent().unwrap()).unwrap();
    let output_path = dir.path().join("out").join("chart.png");
    Workspace {
        _dir: dir,
        data_dir,
        trades_path,
        output_path,
    }
}

/// Writes one trade every `every_min` minutes over `[from, to]`, alternating aggressor side.
pub fn write_trades(path: &Path, from: DateTime<Utc>, to: DateTime<Utc>, every_min: i64) {
    let trades: Vec<serde_json::Value> = (from.timestamp_millis()..=to.timestamp_millis())
        .step_by((every_min * 60_000) as usize)
        .enumerate()
        .map(|(i, t)| {
            serde_json::json!({
                "event_time": t,
                "symbol": "BTCUSDT",
                "price": "67500.0",
                "quantity": format!("{:.3}", 0.5 + i as f64 * 0.01),
                "is_buyer_maker": i % 3 == 0,
            })
        })
        .collect();
    fs::write(path, serde_json::to_string(&trades).unwrap()).unwrap();
}
