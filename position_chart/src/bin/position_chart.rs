use std::{path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, error::ErrorKind};
use position_chart::{
    config::ChartConfig,
    pipeline::{ChartJob, run},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    version,
    about = "Backfill perpetual klines and chart the cumulative signed trade quantity"
)]
struct Cli {
    /// Trade log stored under a `<SYMBOL>_<timeframe>` directory
    trades_path: PathBuf,
    /// Image to write; `.svg` is fully labelled, other extensions are bitmaps
    output_image_path: PathBuf,
    /// TOML configuration (falls back to $POSITION_CHART_CONFIG)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            let _ = e.print();
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match chart(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn chart(cli: Cli) -> Result<()> {
    let config = ChartConfig::load(cli.config.as_deref()).context("loading configuration")?;
    let provider = config.provider()?;
    let store = config.store();

    let job = ChartJob {
        trades_path: cli.trades_path,
        output_path: cli.output_image_path,
        style: config.chart,
    };
    let report = run(&job, &provider, &store, Utc::now()).await?;

    info!(
        symbol = %report.symbol,
        fetched = report.fetched,
        appended = report.appended,
        plotted = report.plotted,
        "done"
    );
    Ok(())
}
