//! Technical indicator implementations.
//!
//! Every calculation takes a causal slice of bars and yields one point per bar:
//! - `IndicatorPoint`: a single point in an indicator time series
//! - `IndicatorValue`: enum for the different output shapes
//! - `IndicatorType`: indicator identity + parameters
//! - `IndicatorSeries`: a time series of indicator values

pub mod atr;
pub mod ema;
pub mod macd;
pub mod rsi;

pub use atr::calculate_atr;
pub use ema::calculate_ema;
pub use macd::calculate_macd;
pub use rsi::calculate_rsi;

use chrono::NaiveDateTime;

#[derive(Debug, Clone)]
pub struct IndicatorPoint {
    pub timestamp: NaiveDateTime,
    pub valid: bool,
    pub value: IndicatorValue,
}

#[derive(Debug, Clone)]
pub enum IndicatorValue {
    Simple(f64),
    Macd {
        line: f64,
        signal: f64,
        histogram: f64,
    },
}

impl IndicatorValue {
    /// Scalar reading: the value itself, or the histogram for MACD.
    pub fn scalar(&self) -> f64 {
        match self {
            IndicatorValue::Simple(v) => *v,
            IndicatorValue::Macd { histogram, .. } => *histogram,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Ema(usize),
    Rsi(usize),
    Atr(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// The last point, if it is past warmup.
    pub fn latest(&self) -> Option<&IndicatorPoint> {
        self.values.last().filter(|p| p.valid)
    }
}

/// Periods for the indicators that feed a market snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorParams {
    pub rsi_period: usize,
    pub atr_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    /// Upper bound on the window handed to the calculations.
    pub max_lookback: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        IndicatorParams {
            rsi_period: 14,
            atr_period: 14,
            macd_fast: macd::DEFAULT_FAST,
            macd_slow: macd::DEFAULT_SLOW,
            macd_signal: macd::DEFAULT_SIGNAL,
            max_lookback: 500,
        }
    }
}

impl IndicatorParams {
    /// Number of bars needed before every indicator has a valid reading.
    pub fn warmup(&self) -> usize {
        let rsi = self.rsi_period + 1;
        let atr = self.atr_period;
        let macd = self.macd_slow.max(self.macd_fast) + self.macd_signal - 1;
        rsi.max(atr).max(macd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_reads_macd_histogram() {
        let v = IndicatorValue::Macd {
            line: 1.5,
            signal: 1.0,
            histogram: 0.5,
        };
        assert!((v.scalar() - 0.5).abs() < f64::EPSILON);
        assert!((IndicatorValue::Simple(42.0).scalar() - 42.0).abs() < f64::EPSILON);
    }

    #[test]
    fn default_warmup_is_macd_bound() {
        // 26 + 9 - 1 = 34 bars
        assert_eq!(IndicatorParams::default().warmup(), 34);
    }

    #[test]
    fn warmup_follows_longest_rsi() {
        let params = IndicatorParams {
            rsi_period: 50,
            ..IndicatorParams::default()
        };
        assert_eq!(params.warmup(), 51);
    }
}
