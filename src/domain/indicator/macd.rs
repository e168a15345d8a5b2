//! MACD (Moving Average Convergence Divergence).
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Warmup: slow - 1 + signal - 1 bars.

use chrono::NaiveDateTime;

use crate::domain::indicator::ema::ema_of;
use crate::domain::indicator::{
    calculate_ema, IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue,
};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

pub fn calculate_macd(
    bars: &[OhlcvBar],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> IndicatorSeries {
    let indicator_type = IndicatorType::Macd {
        fast,
        slow,
        signal: signal_period,
    };
    if bars.is_empty() || fast == 0 || slow == 0 || signal_period == 0 {
        return IndicatorSeries {
            indicator_type,
            values: Vec::new(),
        };
    }

    let ema_fast = calculate_ema(bars, fast);
    let ema_slow = calculate_ema(bars, slow);
    let line_warmup = fast.max(slow) - 1;

    // Only the MACD line past its own warmup feeds the signal EMA.
    let macd_line: Vec<(NaiveDateTime, f64)> = ema_fast
        .values
        .iter()
        .zip(&ema_slow.values)
        .map(|(f, s)| (f.timestamp, f.value.scalar() - s.value.scalar()))
        .collect();
    let signal = ema_of(&macd_line[line_warmup.min(macd_line.len())..], signal_period);

    let mut values = Vec::with_capacity(bars.len());
    for (i, &(timestamp, line)) in macd_line.iter().enumerate() {
        let signal_point = i
            .checked_sub(line_warmup)
            .and_then(|j| signal.values.get(j))
            .filter(|p| p.valid);
        let (valid, signal_value) = match signal_point {
            Some(p) => (true, p.value.scalar()),
            None => (false, 0.0),
        };
        values.push(IndicatorPoint {
            timestamp,
            valid,
            value: IndicatorValue::Macd {
                line,
                signal: signal_value,
                histogram: line - signal_value,
            },
        });
    }

    IndicatorSeries {
        indicator_type,
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bars(prices: &[f64]) -> Vec<OhlcvBar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| OhlcvBar {
                timestamp: start + chrono::Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000.0,
                sentiment: None,
            })
            .collect()
    }

    #[test]
    fn macd_warmup_matches_formula() {
        let prices: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let series = calculate_macd(&make_bars(&prices), 12, 26, 9);

        assert_eq!(series.values.len(), 40);
        // slow - 1 + signal - 1 = 33
        assert!(!series.values[32].valid);
        assert!(series.values[33].valid);
    }

    #[test]
    fn macd_constant_prices_zero_histogram() {
        let series = calculate_macd(&make_bars(&[50.0; 40]), 12, 26, 9);
        let last = series.latest().unwrap();
        assert!(last.value.scalar().abs() < 1e-10);
    }

    #[test]
    fn macd_rising_prices_positive_line() {
        let prices: Vec<f64> = (0..40).map(|i| 100.0 + 2.0 * i as f64).collect();
        let series = calculate_macd(&make_bars(&prices), 12, 26, 9);
        match series.latest().unwrap().value {
            IndicatorValue::Macd { line, .. } => assert!(line > 0.0),
            _ => panic!("Expected Macd value"),
        }
    }

    #[test]
    fn macd_small_periods_by_hand() {
        // fast=1 makes the line close - EMA(2)
        let series = calculate_macd(&make_bars(&[10.0, 20.0, 30.0, 40.0]), 1, 2, 2);
        // EMA(2): [-, 15, 25, 35]; line: [-, 5, 5, 5]; signal seeds at index 2 = 5
        assert!(!series.values[1].valid);
        assert!(series.values[2].valid);
        match series.values[3].value {
            IndicatorValue::Macd {
                line,
                signal,
                histogram,
            } => {
                assert!((line - 5.0).abs() < 1e-12);
                assert!((signal - 5.0).abs() < 1e-12);
                assert!(histogram.abs() < 1e-12);
            }
            _ => panic!("Expected Macd value"),
        }
    }

    #[test]
    fn macd_short_input_is_never_valid() {
        let series = calculate_macd(&make_bars(&[1.0, 2.0, 3.0]), 12, 26, 9);
        assert_eq!(series.values.len(), 3);
        assert!(series.latest().is_none());
    }

    #[test]
    fn macd_zero_period_is_empty() {
        assert!(calculate_macd(&make_bars(&[1.0, 2.0]), 0, 26, 9).values.is_empty());
    }
}
