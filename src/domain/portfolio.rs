//! Portfolio state threaded through the simulation.
//!
//! Values are replaced, never shared: the executor takes one portfolio and
//! returns the next.

use chrono::NaiveDateTime;
use serde::Serialize;

use super::position::Holding;

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub cash: f64,
    pub holding: Option<Holding>,
    pub initial_capital: f64,
    pub paused: bool,
    pub pause_until: Option<NaiveDateTime>,
}

impl Portfolio {
    pub fn new(initial_capital: f64) -> Self {
        Portfolio {
            cash: initial_capital,
            holding: None,
            initial_capital,
            paused: false,
            pause_until: None,
        }
    }

    pub fn asset_quantity(&self) -> f64 {
        self.holding.as_ref().map_or(0.0, |h| h.quantity)
    }

    /// Only defined while something is held.
    pub fn average_entry_price(&self) -> Option<f64> {
        self.holding.as_ref().map(|h| h.average_entry_price)
    }

    /// cash + quantity * price
    pub fn value(&self, price: f64) -> f64 {
        self.cash + self.holding.as_ref().map_or(0.0, |h| h.market_value(price))
    }

    /// Portfolio-level profit relative to initial capital.
    pub fn profit_fraction(&self, price: f64) -> f64 {
        if self.initial_capital > 0.0 {
            (self.value(price) - self.initial_capital) / self.initial_capital
        } else {
            0.0
        }
    }

    /// True while a pause is active at `t`.
    pub fn is_paused_at(&self, t: NaiveDateTime) -> bool {
        self.paused && self.pause_until.is_some_and(|until| t < until)
    }

    pub fn snapshot(&self) -> PortfolioState {
        PortfolioState {
            cash: self.cash,
            asset_quantity: self.asset_quantity(),
            average_entry_price: self.average_entry_price(),
            initial_capital: self.initial_capital,
            paused: self.paused,
            pause_until: self.pause_until,
        }
    }
}

/// Flat serializable view of a portfolio.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioState {
    pub cash: f64,
    pub asset_quantity: f64,
    pub average_entry_price: Option<f64>,
    pub initial_capital: f64,
    pub paused: bool,
    pub pause_until: Option<NaiveDateTime>,
}
