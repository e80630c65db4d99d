//! Provider abstraction for kline sources.
//!
//! This module defines the [`KlineProvider`] trait, the single seam through which the
//! backfill pipeline talks to a remote market-data API. The only production
//! implementation is [`binance_rest::BinanceRestProvider`]; tests substitute their own.
//!
//! The trait is async and object safe so callers can hold a `&dyn KlineProvider`.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use kline_ingestor::models::{candle::Candle, request_params::KlinesRequestParams};
//! use kline_ingestor::providers::{KlineProvider, ProviderError};
//!
//! struct EmptyProvider;
//!
//! #[async_trait]
//! impl KlineProvider for EmptyProvider {
//!     async fn fetch_klines(
//!         &self,
//!         _params: KlinesRequestParams,
//!     ) -> Result<Vec<Candle>, ProviderError> {
//!         Ok(vec![])
//!     }
//! }
//! ```

pub mod binance_rest;

use async_trait::async_trait;
use snafu::{Backtrace, Snafu};

use crate::models::{candle::Candle, request_params::KlinesRequestParams};

/// Trait for fetching klines from a market data provider.
#[async_trait]
pub trait KlineProvider {
    /// Fetches klines for the given request parameters.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<Candle>)` - candles ordered by open time.
    /// * `Err(ProviderError)` - the whole fetch failed; no partial result is returned.
    async fn fetch_klines(&self, params: KlinesRequestParams) -> Result<Vec<Candle>, ProviderError>;
}

/// Errors that can occur during the creation of a provider instance
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderInitError {
    /// failed to init reqwest client
    #[snafu(display("Failed to build HTTP client: {source}"))]
    ClientBuild {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// A setting makes the provider unusable (e.g. a zero page limit).
    #[snafu(display("Invalid provider settings: {message}"))]
    Settings {
        message: String,
        backtrace: Backtrace,
    },
}

/// Errors that can occur within a `KlineProvider` implementation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderError {
    /// An error during an API request (e.g., network failure, timeout, undecodable body).
    #[snafu(display("API request failed: {source}"))]
    Reqwest {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The API answered with a non-success status.
    #[snafu(display("API error (HTTP {status}): {message}"))]
    Api {
        status: u16,
        message: String,
        backtrace: Backtrace,
    },

    /// The request parameters were invalid for this specific provider.
    #[snafu(display("Invalid parameters for provider: {message}"))]
    Validation {
        message: String,
        backtrace: Backtrace,
    },
}
