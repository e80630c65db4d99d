use std::{future::Future, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use snafu::{ResultExt, ensure};
use tracing::{debug, warn};

use crate::{
    models::{candle::Candle, request_params::KlinesRequestParams},
    providers::{
        ApiSnafu, ClientBuildSnafu, KlineProvider, ProviderError, ProviderInitError,
        ReqwestSnafu, SettingsSnafu,
        binance_rest::{
            params::{
                BinanceRestSettings, KLINES_PATH, PageWindow, construct_params, validate_interval,
            },
            response::FetchedKline,
        },
    },
};

pub struct BinanceRestProvider {
    client: Client,
    settings: BinanceRestSettings,
}

impl BinanceRestProvider {
    /// Creates a new provider. The endpoint is public, no credentials are needed.
    pub fn new(settings: BinanceRestSettings) -> Result<Self, ProviderInitError> {
        ensure!(
            settings.page_limit > 0,
            SettingsSnafu {
                message: "page_limit must be > 0"
            }
        );

        let client = Client::builder()
            .user_agent(concat!("kline_ingestor/", env!("CARGO_PKG_VERSION")))
            .build()
            .context(ClientBuildSnafu)?;

        Ok(Self { client, settings })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}{}",
            self.settings.base_url.trim_end_matches('/'),
            KLINES_PATH
        )
    }

    async fn fetch_page(
        &self,
        params: &KlinesRequestParams,
        window: PageWindow,
    ) -> Result<Vec<Candle>, ProviderError> {
        let query = construct_params(params, window, self.settings.page_limit);

        let response = self
            .client
            .get(self.endpoint())
            .query(&query)
            .send()
            .await
            .context(ReqwestSnafu)?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown API error".to_string());
            return ApiSnafu {
                status: status.as_u16(),
                message,
            }
            .fail();
        }

        let rows = response
            .json::<Vec<FetchedKline>>()
            .await
            .context(ReqwestSnafu)?;

        let interval = params.interval.to_string();
        Ok(rows.into_iter().map(|r| r.into_candle(&interval)).collect())
    }
}

#[async_trait]
impl KlineProvider for BinanceRestProvider {
    async fn fetch_klines(&self, params: KlinesRequestParams) -> Result<Vec<Candle>, ProviderError> {
        validate_interval(&params.interval)?;

        let pager = Pager {
            step_ms: params.interval.millis(),
            limit: self.settings.page_limit,
            delay: self.settings.page_delay,
        };
        let start_ms = params.start.timestamp_millis();
        let end_ms = params.end.timestamp_millis();

        let this = self;
        let params = &params;
        paginate(pager, start_ms, end_ms, move |window| {
            this.fetch_page(params, window)
        })
        .await
    }
}

/// Paging policy for a windowed kline endpoint.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Pager {
    pub step_ms: i64,
    pub limit: u32,
    pub delay: Duration,
}

/// Walks `[start_ms, end_ms)` page by page.
///
/// Each page covers at most `limit * step_ms`; the next page starts one step after the last
/// returned open time. Stops on an empty page or once the range is exhausted. The last
/// accumulated candle may still be forming and is dropped.
pub(crate) async fn paginate<F, Fut>(
    pager: Pager,
    start_ms: i64,
    end_ms: i64,
    mut fetch_page: F,
) -> Result<Vec<Candle>, ProviderError>
where
    F: FnMut(PageWindow) -> Fut,
    Fut: Future<Output = Result<Vec<Candle>, ProviderError>>,
{
    let span_ms = pager.limit as i64 * pager.step_ms;
    let mut candles = Vec::new();
    let mut cursor = start_ms;
    let mut first = true;

    while cursor < end_ms {
        if !first && !pager.delay.is_zero() {
            tokio::time::sleep(pager.delay).await;
        }
        first = false;

        let window = PageWindow {
            start_ms: cursor,
            end_ms: end_ms.min(cursor.saturating_add(span_ms)),
        };
        let page = fetch_page(window).await?;
        debug!(
            start_ms = window.start_ms,
            end_ms = window.end_ms,
            rows = page.len(),
            "fetched kline page"
        );

        let Some(last_open) = page.last().map(|c| c.start_time) else {
            break;
        };
        candles.extend(page);

        let next = last_open + pager.step_ms;
        if next <= cursor {
            warn!(cursor, last_open, "kline page did not advance, stopping");
            break;
        }
        cursor = next;
    }

    candles.pop();
    Ok(candles)
}
