use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::timeframe::Timeframe;

/// Contract family of a continuous-contract kline request. Only perpetuals are fetched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContractType {
    #[default]
    Perpetual,
}

impl ContractType {
    pub const fn as_str(self) -> &'static str {
        match self {
            ContractType::Perpetual => "PERPETUAL",
        }
    }
}

/// Vendor-agnostic parameters for requesting klines of one pair.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KlinesRequestParams {
    /// Underlying pair, e.g. `"BTCUSDT"`.
    pub pair: String,

    pub contract_type: ContractType,

    /// Width of each kline. Providers validate it against what their endpoint serves.
    pub interval: Timeframe,

    /// Start of the requested range (inclusive, UTC).
    pub start: DateTime<Utc>,

    /// End of the requested range (exclusive, UTC).
    pub end: DateTime<Utc>,
}
