#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use std::collections::HashMap;
use std::sync::Mutex;
use tradebox::domain::error::TradeboxError;
use tradebox::domain::market::{Direction, MarketSnapshot, Prediction};
pub use tradebox::domain::ohlcv::OhlcvBar;
use tradebox::ports::data_port::DataPort;
use tradebox::ports::market_port::{PredictionPort, SnapshotPort};

pub fn ts(step: usize) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + TimeDelta::hours(step as i64)
}

pub fn make_bar(step: usize, close: f64) -> OhlcvBar {
    OhlcvBar {
        timestamp: ts(step),
        open: close,
        high: close,
        low: close,
        close,
        volume: 1_000.0,
        sentiment: None,
    }
}

pub fn make_bars(closes: &[f64]) -> Vec<OhlcvBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_bar(i, c))
        .collect()
}

pub struct MockDataPort {
    pub bars: Vec<OhlcvBar>,
    pub error: Option<String>,
}

impl MockDataPort {
    pub fn new(bars: Vec<OhlcvBar>) -> Self {
        Self { bars, error: None }
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<OhlcvBar>, TradeboxError> {
        if let Some(reason) = &self.error {
            return Err(TradeboxError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .bars
            .iter()
            .filter(|b| start_date.is_none_or(|s| b.timestamp.date() >= s))
            .filter(|b| end_date.is_none_or(|e| b.timestamp.date() <= e))
            .cloned()
            .collect())
    }
}

/// Indicator readings per step, keyed by timestamp; price always comes from
/// the newest bar of the window it is handed.
#[derive(Default)]
pub struct ScriptedSnapshots {
    pub readings: HashMap<NaiveDateTime, Reading>,
    pub warmup: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct Reading {
    pub oscillator: f64,
    pub volatility: f64,
    pub trend_signal: f64,
    pub sentiment: f64,
}

impl Default for Reading {
    fn default() -> Self {
        Reading {
            oscillator: 50.0,
            volatility: 0.0,
            trend_signal: 0.0,
            sentiment: 50.0,
        }
    }
}

impl ScriptedSnapshots {
    pub fn set(&mut self, step: usize, reading: Reading) {
        self.readings.insert(ts(step), reading);
    }
}

impl SnapshotPort for ScriptedSnapshots {
    fn warmup(&self) -> usize {
        self.warmup
    }

    fn snapshot(&self, window: &[OhlcvBar]) -> Result<Option<MarketSnapshot>, TradeboxError> {
        let Some(last) = window.last() else {
            return Ok(None);
        };
        let r = self.readings.get(&last.timestamp).copied().unwrap_or_default();
        Ok(Some(MarketSnapshot {
            oscillator: r.oscillator,
            volatility: r.volatility,
            trend_signal: r.trend_signal,
            sentiment: r.sentiment,
            ..MarketSnapshot::neutral(last.timestamp, last.close)
        }))
    }
}

/// Snapshot built only from the window: oscillator is a trailing mean of
/// closes mapped onto 0-100, so any future leak shows up in decisions.
pub struct TrailingMeanSnapshots {
    pub window: usize,
}

impl SnapshotPort for TrailingMeanSnapshots {
    fn warmup(&self) -> usize {
        self.window
    }

    fn snapshot(&self, window: &[OhlcvBar]) -> Result<Option<MarketSnapshot>, TradeboxError> {
        if window.len() < self.window {
            return Ok(None);
        }
        let tail = &window[window.len() - self.window..];
        let last = &tail[tail.len() - 1];
        let mean = tail.iter().map(|b| b.close).sum::<f64>() / tail.len() as f64;
        let oscillator = (50.0 + (last.close / mean - 1.0) * 500.0).clamp(0.0, 100.0);
        let volatility = tail
            .windows(2)
            .map(|w| (w[1].close - w[0].close).abs())
            .sum::<f64>()
            / (tail.len() - 1).max(1) as f64;
        Ok(Some(MarketSnapshot {
            oscillator,
            volatility,
            trend_signal: last.close - tail[0].close,
            sentiment: oscillator,
            ..MarketSnapshot::neutral(last.timestamp, last.close)
        }))
    }
}

/// Forecasts the last training close plus its last change, and records how
/// much history each call saw.
#[derive(Default)]
pub struct MomentumPredictor {
    pub seen: Mutex<Vec<(NaiveDateTime, usize, Option<NaiveDateTime>)>>,
}

impl PredictionPort for MomentumPredictor {
    fn predict(
        &self,
        training: &[OhlcvBar],
        current: &MarketSnapshot,
    ) -> Result<Option<Prediction>, TradeboxError> {
        self.seen.lock().unwrap().push((
            current.timestamp,
            training.len(),
            training.last().map(|b| b.timestamp),
        ));
        let [.., prev, last] = training else {
            return Ok(None);
        };
        let predicted_price = (current.price + (last.close - prev.close)).max(0.01);
        Ok(Some(Prediction {
            predicted_price,
            direction: Direction::of_move(current.price, predicted_price, 0.0),
            confidence: 0.9,
            horizon: 1,
        }))
    }
}

/// Fixed forecast per step.
#[derive(Default)]
pub struct ScriptedPredictor {
    pub forecasts: HashMap<NaiveDateTime, Prediction>,
}

impl ScriptedPredictor {
    pub fn set(&mut self, step: usize, predicted_price: f64, confidence: f64) {
        self.forecasts.insert(
            ts(step),
            Prediction {
                predicted_price,
                direction: Direction::Flat,
                confidence,
                horizon: 1,
            },
        );
    }
}

impl PredictionPort for ScriptedPredictor {
    fn predict(
        &self,
        _training: &[OhlcvBar],
        current: &MarketSnapshot,
    ) -> Result<Option<Prediction>, TradeboxError> {
        Ok(self.forecasts.get(&current.timestamp).copied())
    }
}
