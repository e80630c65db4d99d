//! One chart run, end to end.
//!
//! trades path → monitored window → local read → gap detection → (fetch → append → re-read)
//! → trade log → cumulative series → join → render.
//!
//! The provider, the store and the clock are passed in, so a run can be replayed against a
//! fake exchange and a temporary directory.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use kline_ingestor::{
    io::store::KlineStore,
    models::{
        request_params::{ContractType, KlinesRequestParams},
        timeframe::Timeframe,
    },
    providers::KlineProvider,
};
use snafu::ResultExt;
use tracing::{info, warn};

use crate::{
    bucket::MonitoredWindow,
    errors::{PipelineError, RemoteFetchSnafu},
    gaps::detect_gaps,
    path::{TradesPathInfo, parse_trades_path},
    render::{ChartStyle, chart_title, render_chart},
    series::{cumulative_signed_quantity, join_series},
    trades::load_trades,
};

#[derive(Debug, Clone)]
pub struct ChartJob {
    /// Trade log; its `<SYMBOL>_<timeframe>` directory selects pair and window.
    pub trades_path: PathBuf,
    pub output_path: PathBuf,
    pub style: ChartStyle,
}

/// What a run did, for logging and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub window: MonitoredWindow,
    /// Candles read from the store before any backfill.
    pub loaded: usize,
    /// Undecodable store lines seen by the final read.
    pub skipped: usize,
    /// Window slots absent before backfill.
    pub missing: usize,
    pub fetched: usize,
    pub appended: usize,
    pub plotted: usize,
    pub dropped: usize,
    pub output: PathBuf,
}

pub async fn run(
    job: &ChartJob,
    provider: &dyn KlineProvider,
    store: &dyn KlineStore,
    now: DateTime<Utc>,
) -> Result<RunReport, PipelineError> {
    let TradesPathInfo { symbol, timeframe } = parse_trades_path(&job.trades_path)?;
    let window = MonitoredWindow::new(now, timeframe)?;
    let months = window.months();
    info!(
        %symbol,
        %timeframe,
        start = %window.start,
        end = %window.end,
        "monitored window"
    );

    let scan = store.load(&symbol, &months)?;
    let loaded = scan.len();
    info!(loaded, skipped = scan.skipped, "read local klines");

    let gaps = detect_gaps(&scan.candles, window);
    info!(
        expected = gaps.expected,
        present = gaps.present,
        missing = gaps.missing.len(),
        "checked local klines"
    );

    let mut fetched = 0;
    let mut appended = 0;
    let scan = match gaps.backfill_range() {
        Some((start, end)) => {
            info!(%start, %end, "backfilling klines");
            let params = KlinesRequestParams {
                pair: symbol.clone(),
                contract_type: ContractType::Perpetual,
                interval: Timeframe::FIFTEEN_MINUTES,
                start,
                end,
            };
            let candles = provider
                .fetch_klines(params)
                .await
                .context(RemoteFetchSnafu { symbol: &symbol })?;
            fetched = candles.len();

            let summary = store.append(&symbol, &candles)?;
            appended = summary.appended();
            info!(
                fetched,
                appended,
                duplicates = summary.duplicates(),
                "stored backfilled klines"
            );
            store.load(&symbol, &months)?
        }
        None => scan,
    };

    let trades = load_trades(&job.trades_path)?;
    let series = cumulative_signed_quantity(&trades);
    let joined = join_series(scan.candles.values(), &series);
    if joined.dropped > 0 {
        warn!(dropped = joined.dropped, "candles left off the chart");
    }

    render_chart(
        &joined.rows,
        &chart_title(&symbol, timeframe),
        &job.output_path,
        &job.style,
    )?;
    info!(
        rows = joined.rows.len(),
        output = %job.output_path.display(),
        "chart written"
    );

    Ok(RunReport {
        symbol,
        timeframe,
        window,
        loaded,
        skipped: scan.skipped,
        missing: gaps.missing.len(),
        fetched,
        appended,
        plotted: joined.rows.len(),
        dropped: joined.dropped,
        output: job.output_path.clone(),
    })
}
