use std::time::Duration;

use crate::{
    models::{
        request_params::KlinesRequestParams,
        timeframe::{Timeframe, TimeframeUnit},
    },
    providers::{ProviderError, ValidationSnafu},
};

pub const DEFAULT_BASE_URL: &str = "https://fapi.binance.com";
pub const KLINES_PATH: &str = "/fapi/v1/continuousKlines";

/// Largest page the endpoint serves.
pub const DEFAULT_PAGE_LIMIT: u32 = 1500;

/// Fixed pause between successive page requests.
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_millis(300);

/// Connection settings for [`BinanceRestProvider`](super::BinanceRestProvider).
#[derive(Clone, Debug)]
pub struct BinanceRestSettings {
    pub base_url: String,
    pub page_limit: u32,
    pub page_delay: Duration,
}

impl Default for BinanceRestSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            page_limit: DEFAULT_PAGE_LIMIT,
            page_delay: DEFAULT_PAGE_DELAY,
        }
    }
}

/// `[startTime, endTime]` of a single page request, in epoch milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageWindow {
    pub start_ms: i64,
    pub end_ms: i64,
}

/// Rejects intervals the `continuousKlines` endpoint does not serve.
pub fn validate_interval(interval: &Timeframe) -> Result<(), ProviderError> {
    let allowed: &[u32] = match interval.unit() {
        TimeframeUnit::Minute => &[1, 3, 5, 15, 30],
        TimeframeUnit::Hour => &[1, 2, 4, 6, 8, 12],
        TimeframeUnit::Day => &[1, 3],
    };
    if allowed.contains(&interval.amount().get()) {
        Ok(())
    } else {
        ValidationSnafu {
            message: format!("interval {interval} is not served by continuousKlines"),
        }
        .fail()
    }
}

/// Builds the query string pairs for one page.
pub fn construct_params(
    params: &KlinesRequestParams,
    window: PageWindow,
    limit: u32,
) -> Vec<(String, String)> {
    vec![
        ("pair".to_string(), params.pair.to_uppercase()),
        (
            "contractType".to_string(),
            params.contract_type.as_str().to_string(),
        ),
        ("interval".to_string(), params.interval.to_string()),
        ("startTime".to_string(), window.start_ms.to_string()),
        ("endTime".to_string(), window.end_ms.to_string()),
        ("limit".to_string(), limit.to_string()),
    ]
}
