//! Exponential Moving Average.
//!
//! k = 2/(n+1), seeded with the first SMA, then EMA[i] = x[i]*k + EMA[i-1]*(1-k).
//! Warmup: first (n-1) points are invalid.

use chrono::NaiveDateTime;

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_ema(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let closes: Vec<(NaiveDateTime, f64)> = bars.iter().map(|b| (b.timestamp, b.close)).collect();
    ema_of(&closes, period)
}

/// EMA over an arbitrary stamped series. MACD reuses this for its signal line.
pub(crate) fn ema_of(points: &[(NaiveDateTime, f64)], period: usize) -> IndicatorSeries {
    if period == 0 || points.is_empty() {
        return IndicatorSeries {
            indicator_type: IndicatorType::Ema(period),
            values: Vec::new(),
        };
    }

    let mut values = Vec::with_capacity(points.len());
    let k = 2.0 / (period as f64 + 1.0);
    let mut ema = 0.0;
    let mut sum = 0.0;

    for (i, &(timestamp, x)) in points.iter().enumerate() {
        if i < period - 1 {
            sum += x;
            values.push(IndicatorPoint {
                timestamp,
                valid: false,
                value: IndicatorValue::Simple(0.0),
            });
            continue;
        }
        if i == period - 1 {
            sum += x;
            ema = sum / period as f64;
        } else {
            ema = x * k + ema * (1.0 - k);
        }
        values.push(IndicatorPoint {
            timestamp,
            valid: true,
            value: IndicatorValue::Simple(ema),
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Ema(period),
        values,
    }
}
