//! Average True Range with Wilder's smoothing.
//!
//! The first bar's true range is high - low. Seed = mean of the first n true
//! ranges, then ATR[i] = (ATR[i-1] * (n-1) + TR[i]) / n.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_atr(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    if bars.len() < period || period == 0 {
        return IndicatorSeries {
            indicator_type: IndicatorType::Atr(period),
            values: vec![],
        };
    }

    let mut values = Vec::with_capacity(bars.len());
    let mut seed_sum = 0.0;
    let mut atr = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        let tr = match i {
            0 => bar.high - bar.low,
            _ => bar.true_range(bars[i - 1].close),
        };

        let valid = i + 1 >= period;
        if i + 1 < period {
            seed_sum += tr;
        } else if i + 1 == period {
            atr = (seed_sum + tr) / period as f64;
        } else {
            atr = (atr * (period - 1) as f64 + tr) / period as f64;
        }

        values.push(IndicatorPoint {
            timestamp: bar.timestamp,
            valid,
            value: IndicatorValue::Simple(if valid { atr } else { 0.0 }),
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Atr(period),
        values,
    }
}
