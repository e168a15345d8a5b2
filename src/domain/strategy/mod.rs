//! Strategy evaluators, in priority order.
//!
//! Each evaluator is a pure function of (portfolio, snapshot, config). It
//! returns `None` for "no signal" and only emits decisions the executor can
//! carry out.

pub mod circuit_breaker;
pub mod dca;
pub mod stop_loss;
pub mod swing;
pub mod take_profit;

use crate::domain::config::TradingConfig;
use crate::domain::decision::{Decision, StrategyTag};
use crate::domain::market::MarketSnapshot;
use crate::domain::portfolio::Portfolio;

pub use circuit_breaker::CircuitBreaker;
pub use dca::DcaEntry;
pub use stop_loss::StopLoss;
pub use swing::SwingEntry;
pub use take_profit::TakeProfit;

/// Tolerance on profit-threshold comparisons.
pub(crate) const EPSILON: f64 = 1e-9;

pub trait Evaluator: Send + Sync {
    fn tag(&self) -> StrategyTag;

    fn evaluate(
        &self,
        portfolio: &Portfolio,
        snapshot: &MarketSnapshot,
        config: &TradingConfig,
    ) -> Option<Decision>;
}

/// Circuit breaker, stop-loss, take-profit, swing entry, DCA entry.
pub fn default_chain() -> Vec<Box<dyn Evaluator>> {
    vec![
        Box::new(CircuitBreaker),
        Box::new(StopLoss),
        Box::new(TakeProfit),
        Box::new(SwingEntry),
        Box::new(DcaEntry),
    ]
}

/// Cash amount for a fractional buy, if it is worth placing.
pub(crate) fn buy_amount(cash: f64, fraction: f64, min_order_cash: f64) -> Option<f64> {
    let amount = cash * fraction;
    (amount > 0.0 && amount >= min_order_cash && amount <= cash).then_some(amount)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_order() {
        let tags: Vec<StrategyTag> = default_chain().iter().map(|e| e.tag()).collect();
        assert_eq!(
            tags,
            vec![
                StrategyTag::CircuitBreaker,
                StrategyTag::StopLoss,
                StrategyTag::TakeProfit,
                StrategyTag::Swing,
                StrategyTag::Dca,
            ]
        );
    }

    #[test]
    fn buy_amount_respects_minimum() {
        assert_eq!(buy_amount(10_000.0, 0.1, 10.0), Some(1_000.0));
        assert_eq!(buy_amount(50.0, 0.1, 10.0), None);
        assert_eq!(buy_amount(0.0, 0.1, 0.0), None);
    }
}
