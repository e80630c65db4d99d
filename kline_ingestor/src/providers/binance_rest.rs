//! Binance USDⓈ-M futures `continuousKlines` REST provider.

pub mod params;
pub mod provider;
pub mod response;

pub use params::{BinanceRestSettings, DEFAULT_BASE_URL, DEFAULT_PAGE_DELAY, DEFAULT_PAGE_LIMIT};
pub use provider::BinanceRestProvider;
