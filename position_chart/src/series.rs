//! Cumulative signed trade quantity and its alignment with candles.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use kline_ingestor::models::candle::Candle;

use crate::{
    bucket::{STORE_STEP_MS, store_bucket_ms},
    trades::TradeRecord,
};

/// Running total of signed quantity at the end of one 15-minute bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    /// Bucket open time, ms since the Unix epoch.
    pub bucket: i64,
    pub cumulative: f64,
}

/// Sums signed quantity per 15-minute bucket and accumulates it.
///
/// Buckets between the first and last trade with no trades carry the previous total.
pub fn cumulative_signed_quantity(trades: &[TradeRecord]) -> Vec<SeriesPoint> {
    let mut per_bucket: BTreeMap<i64, f64> = BTreeMap::new();
    for trade in trades {
        *per_bucket.entry(store_bucket_ms(trade.event_time)).or_default() +=
            trade.signed_quantity();
    }

    let (Some(&first), Some(&last)) = (per_bucket.keys().next(), per_bucket.keys().next_back())
    else {
        return Vec::new();
    };

    let mut total = 0.0;
    (first..=last)
        .step_by(STORE_STEP_MS as usize)
        .map(|bucket| {
            total += per_bucket.get(&bucket).copied().unwrap_or(0.0);
            SeriesPoint {
                bucket,
                cumulative: total,
            }
        })
        .collect()
}

/// One plotted candle with the position total in effect at its open.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRow {
    pub time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub cumulative: f64,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct JoinOutcome {
    pub rows: Vec<ChartRow>,
    /// Candles left out: before the first bucket, or with non-finite prices/volume.
    pub dropped: usize,
}

/// Pairs each candle with the latest series value at or before its open time.
///
/// `series` must be sorted by bucket, as produced by [`cumulative_signed_quantity`].
pub fn join_series<'a>(
    candles: impl IntoIterator<Item = &'a Candle>,
    series: &[SeriesPoint],
) -> JoinOutcome {
    let mut outcome = JoinOutcome::default();

    for candle in candles {
        let at = series.partition_point(|p| p.bucket <= candle.start_time);
        let row = match (at.checked_sub(1), candle.open_time()) {
            (Some(idx), Some(time)) if candle.is_finite() => ChartRow {
                time,
                open: candle.open,
                high: candle.high,
                low: candle.low,
                close: candle.close,
                volume: candle.volume,
                cumulative: series[idx].cumulative,
            },
            _ => {
                outcome.dropped += 1;
                continue;
            }
        };
        outcome.rows.push(row);
    }

    outcome.rows.sort_by_key(|r| r.time);
    outcome
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    const T0: i64 = 1_717_200_000_000; // 2024-06-01T00:00Z
    const MIN: i64 = 60_000;

    fn trade(event_time: i64, quantity: f64, is_buyer_maker: bool) -> TradeRecord {
        TradeRecord {
            event_time,
            quantity,
            is_buyer_maker,
        }
    }

    fn candle(start_time: i64, close: f64) -> Candle {
        Candle {
            start_time,
            end_time: start_time + STORE_STEP_MS - 1,
            interval: "15m".into(),
            open: 100.0,
            high: 110.0,
            low: 90.0,
            close,
            volume: 5.0,
            quote_volume: 500.0,
            trade_count: 3,
            taker_buy_base_volume: 2.0,
            taker_buy_quote_volume: 200.0,
        }
    }

    #[test]
    fn sums_buckets_and_fills_quiet_ones() {
        let trades = vec![
            trade(T0 + 14 * MIN, 1.0, true),
            trade(T0 + MIN, 3.0, false),
            trade(T0 + 46 * MIN, 0.5, false),
        ];

        let series = cumulative_signed_quantity(&trades);
        let got: Vec<(i64, f64)> = series.iter().map(|p| (p.bucket, p.cumulative)).collect();
        assert_eq!(
            got,
            vec![
                (T0, 2.0),
                (T0 + 15 * MIN, 2.0),
                (T0 + 30 * MIN, 2.0),
                (T0 + 45 * MIN, 2.5),
            ]
        );
    }

    #[test]
    fn no_trades_no_series() {
        assert!(cumulative_signed_quantity(&[]).is_empty());
    }

    #[test]
    fn join_forward_fills_and_drops_leading_candles() {
        let series = vec![
            SeriesPoint { bucket: T0 + 15 * MIN, cumulative: 1.0 },
            SeriesPoint { bucket: T0 + 30 * MIN, cumulative: -2.0 },
        ];
        let candles = vec![
            candle(T0, 1.0),
            candle(T0 + 15 * MIN, 2.0),
            candle(T0 + 30 * MIN, 3.0),
            candle(T0 + 60 * MIN, 4.0),
        ];

        let out = join_series(&candles, &series);
        assert_eq!(out.dropped, 1);
        let got: Vec<(f64, f64)> = out.rows.iter().map(|r| (r.close, r.cumulative)).collect();
        assert_eq!(got, vec![(2.0, 1.0), (3.0, -2.0), (4.0, -2.0)]);
        assert_eq!(
            out.rows[0].time,
            Utc.timestamp_millis_opt(T0 + 15 * MIN).unwrap()
        );
    }

    #[test]
    fn join_drops_non_finite_candles() {
        let series = vec![SeriesPoint { bucket: T0, cumulative: 1.0 }];
        let mut bad = candle(T0 + 15 * MIN, 1.0);
        bad.high = f64::NAN;

        let out = join_series(&[candle(T0, 1.0), bad], &series);
        assert_eq!(out.rows.len(), 1);
        assert_eq!(out.dropped, 1);
    }
}
