//! Market snapshots computed from technical indicators over the causal window.
//!
//! oscillator = RSI, volatility = ATR, trend_signal = MACD histogram.

use crate::domain::error::TradeboxError;
use crate::domain::indicator::{
    IndicatorParams, IndicatorSeries, calculate_atr, calculate_macd, calculate_rsi,
};
use crate::domain::market::{MarketSnapshot, NEUTRAL_LEVEL};
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::market_port::SnapshotPort;

pub struct IndicatorSnapshotProvider {
    params: IndicatorParams,
}

impl IndicatorSnapshotProvider {
    pub fn new(params: IndicatorParams) -> Self {
        Self { params }
    }
}

impl Default for IndicatorSnapshotProvider {
    fn default() -> Self {
        Self::new(IndicatorParams::default())
    }
}

/// Sentiment stand-in derived from the oscillator when the data has none.
pub fn sentiment_proxy(oscillator: f64) -> f64 {
    if oscillator < 30.0 {
        20.0
    } else if oscillator < 40.0 {
        35.0
    } else if oscillator > 70.0 {
        80.0
    } else if oscillator > 60.0 {
        65.0
    } else {
        NEUTRAL_LEVEL
    }
}

fn latest_scalar(series: &IndicatorSeries) -> Option<f64> {
    series.latest().map(|p| p.value.scalar())
}

impl SnapshotPort for IndicatorSnapshotProvider {
    fn warmup(&self) -> usize {
        self.params.warmup()
    }

    fn snapshot(&self, window: &[OhlcvBar]) -> Result<Option<MarketSnapshot>, TradeboxError> {
        let start = window.len().saturating_sub(self.params.max_lookback);
        let window = &window[start..];
        let Some(last) = window.last() else {
            return Ok(None);
        };
        if window.len() < self.warmup() {
            return Ok(None);
        }

        let p = &self.params;
        let oscillator = latest_scalar(&calculate_rsi(window, p.rsi_period));
        let volatility = latest_scalar(&calculate_atr(window, p.atr_period));
        let trend = latest_scalar(&calculate_macd(window, p.macd_fast, p.macd_slow, p.macd_signal));

        let (Some(oscillator), Some(volatility), Some(trend_signal)) = (oscillator, volatility, trend)
        else {
            return Ok(None);
        };

        Ok(Some(MarketSnapshot {
            oscillator,
            volatility,
            trend_signal,
            sentiment: last.sentiment.unwrap_or_else(|| sentiment_proxy(oscillator)),
            ..MarketSnapshot::neutral(last.timestamp, last.close)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

    fn ts(i: usize) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + TimeDelta::days(i as i64)
    }

    fn bars(closes: &[f64]) -> Vec<OhlcvBar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| OhlcvBar {
                timestamp: ts(i),
                open: c,
                high: c + 1.0,
                low: c - 1.0,
                close: c,
                volume: 1000.0,
                sentiment: None,
            })
            .collect()
    }

    #[test]
    fn none_before_warmup() {
        let provider = IndicatorSnapshotProvider::default();
        let data = bars(&vec![100.0; provider.warmup() - 1]);
        assert!(provider.snapshot(&data).unwrap().is_none());
        assert!(provider.snapshot(&[]).unwrap().is_none());
    }

    #[test]
    fn rising_series_is_overbought_with_positive_trend() {
        let provider = IndicatorSnapshotProvider::default();
        let closes: Vec<f64> = (0..60).map(|i| 100.0 * 1.01_f64.powi(i)).collect();
        let data = bars(&closes);
        let s = provider.snapshot(&data).unwrap().unwrap();

        assert_eq!(s.timestamp, ts(59));
        assert_eq!(s.price, closes[59]);
        assert!((s.oscillator - 100.0).abs() < 1e-9);
        assert!(s.trend_signal > 0.0);
        assert!(s.volatility > 0.0);
        assert_eq!(s.sentiment, 80.0);
        assert!(!s.has_prediction());
    }

    #[test]
    fn flat_series_is_neutral() {
        let provider = IndicatorSnapshotProvider::default();
        let data = bars(&vec![100.0; 40]);
        let s = provider.snapshot(&data).unwrap().unwrap();
        assert!((s.oscillator - NEUTRAL_LEVEL).abs() < f64::EPSILON);
        assert!(s.trend_signal.abs() < 1e-9);
        assert!((s.volatility - 2.0).abs() < 1e-9);
        assert_eq!(s.sentiment, NEUTRAL_LEVEL);
    }

    #[test]
    fn bar_sentiment_wins_over_proxy() {
        let provider = IndicatorSnapshotProvider::default();
        let mut data = bars(&vec![100.0; 40]);
        data[39].sentiment = Some(12.0);
        let s = provider.snapshot(&data).unwrap().unwrap();
        assert_eq!(s.sentiment, 12.0);
    }

    #[test]
    fn lookback_bounds_the_window() {
        let params = IndicatorParams {
            max_lookback: 40,
            ..IndicatorParams::default()
        };
        let provider = IndicatorSnapshotProvider::new(params);
        let mut closes = vec![1.0; 100];
        closes.extend(vec![100.0; 40]);
        let s = provider.snapshot(&bars(&closes)).unwrap().unwrap();
        // the jump from 1 to 100 is outside the last 40 bars
        assert!((s.oscillator - NEUTRAL_LEVEL).abs() < f64::EPSILON);
    }

    #[test]
    fn proxy_bands() {
        assert_eq!(sentiment_proxy(10.0), 20.0);
        assert_eq!(sentiment_proxy(35.0), 35.0);
        assert_eq!(sentiment_proxy(50.0), 50.0);
        assert_eq!(sentiment_proxy(65.0), 65.0);
        assert_eq!(sentiment_proxy(75.0), 80.0);
    }
}
