//! RSI (Relative Strength Index) with Wilder's smoothing.
//!
//! - First average: simple mean of gains/losses over the first n changes
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! RSI = 100 - (100 / (1 + avg_gain / avg_loss)).
//! A window with no movement at all reads the neutral 50; only gains reads 100.
//!
//! Warmup: first n bars are invalid (n price changes are needed).

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::market::NEUTRAL_LEVEL;
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_rsi(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let invalid = |bar: &OhlcvBar| IndicatorPoint {
        timestamp: bar.timestamp,
        valid: false,
        value: IndicatorValue::Simple(0.0),
    };

    if period == 0 || bars.len() < 2 {
        return IndicatorSeries {
            indicator_type: IndicatorType::Rsi(period),
            values: bars.iter().map(invalid).collect(),
        };
    }

    let mut values = Vec::with_capacity(bars.len());
    values.push(invalid(&bars[0]));

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    let mut gain_sum = 0.0;
    let mut loss_sum = 0.0;

    for (i, pair) in bars.windows(2).enumerate() {
        let change = pair[1].close - pair[0].close;
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);

        if i < period - 1 {
            gain_sum += gain;
            loss_sum += loss;
            values.push(invalid(&pair[1]));
            continue;
        }
        if i == period - 1 {
            avg_gain = (gain_sum + gain) / period as f64;
            avg_loss = (loss_sum + loss) / period as f64;
        } else {
            avg_gain = (avg_gain * (period - 1) as f64 + gain) / period as f64;
            avg_loss = (avg_loss * (period - 1) as f64 + loss) / period as f64;
        }
        values.push(IndicatorPoint {
            timestamp: pair[1].timestamp,
            valid: true,
            value: IndicatorValue::Simple(rsi_from_averages(avg_gain, avg_loss)),
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Rsi(period),
        values,
    }
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain == 0.0 {
            NEUTRAL_LEVEL
        } else {
            100.0
        }
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}
