//! Raw price observation for one time step.

use chrono::NaiveDateTime;

use super::error::TradeboxError;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    /// Sentiment index for the step when the source carries one (0-100).
    pub sentiment: Option<f64>,
}

impl OhlcvBar {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }

    /// Reject values that cannot be traded on. `step` is only used for the error.
    pub fn validate(&self, step: usize) -> Result<(), TradeboxError> {
        let malformed = |reason: String| TradeboxError::MalformedRecord { step, reason };

        if !self.close.is_finite() || self.close <= 0.0 {
            return Err(malformed(format!("close must be positive, got {}", self.close)));
        }
        for (name, value) in [("open", self.open), ("high", self.high), ("low", self.low)] {
            if !value.is_finite() || value < 0.0 {
                return Err(malformed(format!("{name} must be non-negative, got {value}")));
            }
        }
        if self.high < self.low {
            return Err(malformed(format!(
                "high {} below low {}",
                self.high, self.low
            )));
        }
        if !self.volume.is_finite() || self.volume < 0.0 {
            return Err(malformed(format!(
                "volume must be non-negative, got {}",
                self.volume
            )));
        }
        if let Some(s) = self.sentiment {
            if !s.is_finite() {
                return Err(malformed("sentiment is not finite".into()));
            }
        }
        Ok(())
    }
}
