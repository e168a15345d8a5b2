//! Market snapshot and forecast values consumed by the strategy chain.

use chrono::NaiveDateTime;
use serde::Serialize;

use super::error::TradeboxError;

/// Neutral midpoint for the oscillator and sentiment scales.
pub const NEUTRAL_LEVEL: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Up,
    Down,
    Flat,
}

impl Direction {
    /// Direction of a move from `from` to `to`, with `band` as the relative dead zone.
    pub fn of_move(from: f64, to: f64, band: f64) -> Direction {
        if to > from * (1.0 + band) {
            Direction::Up
        } else if to < from * (1.0 - band) {
            Direction::Down
        } else {
            Direction::Flat
        }
    }
}

/// Output of the forecasting collaborator for one step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    pub predicted_price: f64,
    pub direction: Direction,
    /// 0.0 - 1.0
    pub confidence: f64,
    /// Number of steps ahead the forecast targets.
    pub horizon: usize,
}

impl Prediction {
    /// Finite positive price and a confidence inside [0, 1].
    pub fn is_usable(&self) -> bool {
        self.predicted_price.is_finite()
            && self.predicted_price > 0.0
            && (0.0..=1.0).contains(&self.confidence)
    }
}

/// Everything the evaluators may look at for one step.
///
/// Built from observations at or before `timestamp` only.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketSnapshot {
    pub timestamp: NaiveDateTime,
    pub price: f64,
    pub oscillator: f64,
    pub volatility: f64,
    pub trend_signal: f64,
    pub sentiment: f64,
    pub predicted_price: Option<f64>,
    pub direction_confidence: Option<f64>,
}

impl MarketSnapshot {
    /// Snapshot with neutral indicator readings.
    pub fn neutral(timestamp: NaiveDateTime, price: f64) -> Self {
        MarketSnapshot {
            timestamp,
            price,
            oscillator: NEUTRAL_LEVEL,
            volatility: 0.0,
            trend_signal: 0.0,
            sentiment: NEUTRAL_LEVEL,
            predicted_price: None,
            direction_confidence: None,
        }
    }

    pub fn with_prediction(mut self, prediction: Option<&Prediction>) -> Self {
        self.predicted_price = prediction.map(|p| p.predicted_price);
        self.direction_confidence = prediction.map(|p| p.confidence);
        self
    }

    pub fn has_prediction(&self) -> bool {
        self.predicted_price.is_some() && self.direction_confidence.is_some()
    }

    pub fn validate(&self, step: usize) -> Result<(), TradeboxError> {
        let malformed = |reason: String| TradeboxError::MalformedRecord { step, reason };

        if !self.price.is_finite() || self.price <= 0.0 {
            return Err(malformed(format!("snapshot price must be positive, got {}", self.price)));
        }
        for (name, value) in [
            ("oscillator", self.oscillator),
            ("trend_signal", self.trend_signal),
            ("sentiment", self.sentiment),
        ] {
            if !value.is_finite() {
                return Err(malformed(format!("{name} is not finite")));
            }
        }
        if !self.volatility.is_finite() || self.volatility < 0.0 {
            return Err(malformed(format!(
                "volatility must be non-negative, got {}",
                self.volatility
            )));
        }
        if let Some(p) = self.predicted_price {
            if !p.is_finite() {
                return Err(malformed("predicted_price is not finite".into()));
            }
        }
        if let Some(c) = self.direction_confidence {
            if !(0.0..=1.0).contains(&c) {
                return Err(malformed(format!("direction_confidence {c} outside [0, 1]")));
            }
        }
        Ok(())
    }
}
