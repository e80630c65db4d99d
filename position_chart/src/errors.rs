use std::path::PathBuf;

use kline_ingestor::{
    io::store::SinkError,
    models::timeframe::{Timeframe, TimeframeError},
    providers::{ProviderError, ProviderInitError},
};
use snafu::{Backtrace, Snafu};

use crate::{render::RenderError, trades::TradeLogError};

/// The run cannot start: bad input path, timeframe or configuration.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ConfigError {
    #[snafu(display(
        "Trades path {} has no `<symbol>_<timeframe>` directory",
        path.display()
    ))]
    TradesPath { path: PathBuf, backtrace: Backtrace },

    #[snafu(display("Invalid timeframe in trades path {}: {source}", path.display()))]
    Timeframe {
        path: PathBuf,
        source: TimeframeError,
        backtrace: Backtrace,
    },

    #[snafu(display("Timeframe {timeframe} reaches outside the supported date range"))]
    WindowRange {
        timeframe: Timeframe,
        backtrace: Backtrace,
    },

    #[snafu(display("Failed to read config file {}: {source}", path.display()))]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("Invalid config file {}: {source}", path.display()))]
    ParseFile {
        path: PathBuf,
        source: toml::de::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("Invalid value {value:?} for {key}: {message}"))]
    EnvValue {
        key: String,
        value: String,
        message: String,
        backtrace: Backtrace,
    },

    #[snafu(display("Invalid setting `{field}`: {message}"))]
    Setting {
        field: String,
        message: String,
        backtrace: Backtrace,
    },
}

/// Any failure that aborts a chart run.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum PipelineError {
    #[snafu(context(false), display("{source}"))]
    Config { source: ConfigError },

    #[snafu(display("Failed to set up kline provider: {source}"))]
    ProviderInit { source: ProviderInitError },

    #[snafu(display("Failed to fetch klines for {symbol}: {source}"))]
    RemoteFetch {
        symbol: String,
        source: ProviderError,
    },

    #[snafu(context(false), display("Kline store error: {source}"))]
    Store { source: SinkError },

    #[snafu(context(false), display("Trade log error: {source}"))]
    Trades { source: TradeLogError },

    #[snafu(context(false), display("Chart rendering failed: {source}"))]
    Render { source: RenderError },
}
