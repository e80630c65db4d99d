//! Timeframe utilities for expressing uniform bar intervals.
//!
//! A [`Timeframe`] pairs a non-zero amount with a [`TimeframeUnit`] (minute, hour
//! or day). The string form is the compact `<amount><unit>` token used both by the
//! exchange's `interval` parameter and by the monitor's directory names:
//!
//! ```
//! use kline_ingestor::models::timeframe::{Timeframe, TimeframeUnit};
//!
//! let tf: Timeframe = "4h".parse().unwrap();
//! assert_eq!(tf.unit(), TimeframeUnit::Hour);
//! assert_eq!(tf.minutes(), 240);
//! assert_eq!(tf.to_string(), "4h");
//! ```

use std::{fmt, num::NonZeroU32, str::FromStr};

use chrono::Duration;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimeframeError {
    #[error("Invalid amount in timeframe {input:?}: {message}")]
    InvalidAmount { input: String, message: String },

    #[error("Unsupported timeframe unit {unit:?} in {input:?} (expected m, h or d)")]
    UnsupportedUnit { input: String, unit: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },
}

/// Timeframe granularity, all in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeframeUnit {
    Minute,
    Hour,
    Day,
}

impl TimeframeUnit {
    /// Width of one unit in minutes.
    pub const fn minutes(self) -> i64 {
        match self {
            TimeframeUnit::Minute => 1,
            TimeframeUnit::Hour => 60,
            TimeframeUnit::Day => 60 * 24,
        }
    }

    const fn suffix(self) -> char {
        match self {
            TimeframeUnit::Minute => 'm',
            TimeframeUnit::Hour => 'h',
            TimeframeUnit::Day => 'd',
        }
    }
}

/// A timeframe = amount × unit (e.g., 15-Minute, 4-Hour, 1-Day).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timeframe {
    pub amount: NonZeroU32,
    pub unit: TimeframeUnit,
}

const FIFTEEN: NonZeroU32 = match NonZeroU32::new(15) {
    Some(nz) => nz,
    None => unreachable!(),
};

impl Timeframe {
    /// Granularity of the local kline store.
    pub const FIFTEEN_MINUTES: Timeframe = Timeframe::new(FIFTEEN, TimeframeUnit::Minute);

    pub const fn new(amount: NonZeroU32, unit: TimeframeUnit) -> Self {
        Self { amount, unit }
    }

    pub const fn amount(&self) -> NonZeroU32 {
        self.amount
    }

    pub const fn unit(&self) -> TimeframeUnit {
        self.unit
    }

    /// Total width in minutes.
    pub const fn minutes(&self) -> i64 {
        self.amount.get() as i64 * self.unit.minutes()
    }

    pub const fn millis(&self) -> i64 {
        self.minutes() * 60_000
    }

    pub fn duration(&self) -> Duration {
        Duration::minutes(self.minutes())
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount.get(), self.unit.suffix())
    }
}

impl FromStr for Timeframe {
    type Err = TimeframeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((split, unit_char)) = s.char_indices().last() else {
            return Err(TimeframeError::InvalidInput {
                message: "empty timeframe".into(),
            });
        };
        let (digits, unit_str) = s.split_at(split);

        let unit = match unit_char {
            'm' => TimeframeUnit::Minute,
            'h' => TimeframeUnit::Hour,
            'd' => TimeframeUnit::Day,
            _ => {
                return Err(TimeframeError::UnsupportedUnit {
                    input: s.to_string(),
                    unit: unit_str.to_string(),
                });
            }
        };

        // `u32::from_str` would also take a leading '+'
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TimeframeError::InvalidAmount {
                input: s.to_string(),
                message: "amount must be a positive integer".into(),
            });
        }
        let amount_num: u32 = digits.parse().map_err(|e| TimeframeError::InvalidAmount {
            input: s.to_string(),
            message: format!("{e}"),
        })?;
        let amount = NonZeroU32::new(amount_num).ok_or_else(|| TimeframeError::InvalidAmount {
            input: s.to_string(),
            message: "amount must be > 0".into(),
        })?;

        Ok(Timeframe::new(amount, unit))
    }
}

impl Serialize for Timeframe {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timeframe {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// Parses a `<n><unit>` token and returns its width in minutes.
pub fn timeframe_to_minutes(s: &str) -> Result<i64, TimeframeError> {
    s.parse::<Timeframe>().map(|tf| tf.minutes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_units() {
        assert_eq!(timeframe_to_minutes("15m").unwrap(), 15);
        assert_eq!(timeframe_to_minutes("4h").unwrap(), 240);
        assert_eq!(timeframe_to_minutes("1d").unwrap(), 1440);
        assert_eq!(Timeframe::FIFTEEN_MINUTES.to_string(), "15m");
    }

    #[test]
    fn rejects_other_units() {
        for bad in ["1w", "1M", "1D", "15s", "15"] {
            assert!(
                matches!(bad.parse::<Timeframe>(), Err(TimeframeError::UnsupportedUnit { .. })),
                "{bad} should be rejected by unit"
            );
        }
    }

    #[test]
    fn rejects_bad_amounts() {
        for bad in ["m", "0m", "-1h", "+1h", "x5m", "99999999999m"] {
            assert!(
                matches!(bad.parse::<Timeframe>(), Err(TimeframeError::InvalidAmount { .. })),
                "{bad} should be rejected by amount"
            );
        }
        assert!(matches!(
            "".parse::<Timeframe>(),
            Err(TimeframeError::InvalidInput { .. })
        ));
    }

    #[test]
    fn non_ascii_unit_does_not_panic() {
        assert!("5€".parse::<Timeframe>().is_err());
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn minutes_scale_with_unit(n in 1u32..100_000, unit in prop::sample::select(vec!['m', 'h', 'd'])) {
            let factor = match unit { 'm' => 1, 'h' => 60, _ => 1440 };
            let got = timeframe_to_minutes(&format!("{n}{unit}")).unwrap();
            prop_assert_eq!(got, n as i64 * factor);
        }

        #[test]
        fn display_round_trips(n in 1u32..100_000, unit in prop::sample::select(vec!['m', 'h', 'd'])) {
            let tf: Timeframe = format!("{n}{unit}").parse().unwrap();
            prop_assert_eq!(tf.to_string().parse::<Timeframe>().unwrap(), tf);
        }
    }
}
