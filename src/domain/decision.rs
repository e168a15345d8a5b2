//! Decisions emitted by the strategy chain and the records they leave behind.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;

use super::market::Prediction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Buy,
    SellAll,
    SellHalf,
    Pause,
    Hold,
}

impl Action {
    pub fn is_sell(self) -> bool {
        matches!(self, Action::SellAll | Action::SellHalf)
    }

    /// Actions that change cash or holdings.
    pub fn is_trade(self) -> bool {
        matches!(self, Action::Buy | Action::SellAll | Action::SellHalf)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::Buy => "BUY",
            Action::SellAll => "SELL_ALL",
            Action::SellHalf => "SELL_HALF",
            Action::Pause => "PAUSE",
            Action::Hold => "HOLD",
        };
        f.write_str(s)
    }
}

/// Which evaluator produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrategyTag {
    CircuitBreaker,
    StopLoss,
    TakeProfit,
    Swing,
    Dca,
    Hold,
}

impl fmt::Display for StrategyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StrategyTag::CircuitBreaker => "CIRCUIT_BREAKER",
            StrategyTag::StopLoss => "STOP_LOSS",
            StrategyTag::TakeProfit => "TAKE_PROFIT",
            StrategyTag::Swing => "SWING",
            StrategyTag::Dca => "DCA",
            StrategyTag::Hold => "HOLD",
        };
        f.write_str(s)
    }
}

/// A single decision for one step.
///
/// `amount` is cash for `Buy`, asset quantity for the sell actions and zero
/// for `Pause` and `Hold`.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub action: Action,
    pub strategy: StrategyTag,
    pub amount: f64,
    pub reason: String,
    pub confidence: Option<f64>,
}

impl Decision {
    pub fn hold(reason: impl Into<String>) -> Self {
        Decision {
            action: Action::Hold,
            strategy: StrategyTag::Hold,
            amount: 0.0,
            reason: reason.into(),
            confidence: None,
        }
    }

    pub fn new(action: Action, strategy: StrategyTag, amount: f64, reason: impl Into<String>) -> Self {
        Decision {
            action,
            strategy,
            amount,
            reason: reason.into(),
            confidence: None,
        }
    }

    pub fn with_confidence(mut self, confidence: Option<f64>) -> Self {
        self.confidence = confidence;
        self
    }
}

/// One entry of the append-only step history.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeRecord {
    pub timestamp: NaiveDateTime,
    pub action: Action,
    pub strategy: StrategyTag,
    pub price: f64,
    pub amount: f64,
    pub reason: String,
    /// Average entry price of the holding a sell was taken from.
    pub entry_price: Option<f64>,
    pub cash: f64,
    pub asset_quantity: f64,
    pub portfolio_value: f64,
    pub prediction: Option<Prediction>,
}
