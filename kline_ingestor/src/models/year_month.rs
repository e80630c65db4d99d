//! Calendar-month partition keys for the local kline store.

use std::fmt;

use chrono::{DateTime, Datelike, TimeZone, Utc};

/// A `(year, month)` partition, rendered as `yyyymm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct YearMonth {
    pub year: i32,
    /// 1..=12
    pub month: u32,
}

impl YearMonth {
    pub fn of(ts: DateTime<Utc>) -> Self {
        Self {
            year: ts.year(),
            month: ts.month(),
        }
    }

    pub fn from_millis(ms: i64) -> Option<Self> {
        Utc.timestamp_millis_opt(ms).single().map(Self::of)
    }

    pub fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}{:02}", self.year, self.month)
    }
}

/// Every month touched by `[start, end]`, both ends inclusive. Empty when `end` falls in an
/// earlier month than `start`.
pub fn months_between(start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<YearMonth> {
    let last = YearMonth::of(end);
    let mut cur = YearMonth::of(start);
    let mut out = Vec::new();
    while cur <= last {
        out.push(cur);
        cur = cur.next();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_zero_padded() {
        let ym = YearMonth { year: 2024, month: 6 };
        assert_eq!(ym.to_string(), "202406");
    }

    #[test]
    fn spans_year_boundary() {
        let start = Utc.with_ymd_and_hms(2024, 11, 30, 20, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap();
        let keys: Vec<String> = months_between(start, end)
            .into_iter()
            .map(|m| m.to_string())
            .collect();
        assert_eq!(keys, vec!["202411", "202412", "202501"]);
    }

    #[test]
    fn same_month_is_single_key() {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 6, 1, 3, 45, 0).unwrap();
        assert_eq!(months_between(start, end), vec![YearMonth { year: 2024, month: 6 }]);
    }

    #[test]
    fn inverted_range_is_empty() {
        let start = Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap();
        assert!(months_between(start, end).is_empty());
    }
}
