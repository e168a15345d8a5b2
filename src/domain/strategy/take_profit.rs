//! Tiered exits, most severe first.
//!
//! 1. Emergency: deeply overbought, trend turning down and a forecast fall.
//! 2. Full exit: portfolio profit at the high tier with the oscillator overbought.
//! 3. Half exit: portfolio profit at the lower tier with the oscillator high.
//!
//! Profit is portfolio-level against initial capital, not per lot.

use crate::domain::config::TradingConfig;
use crate::domain::decision::{Action, Decision, StrategyTag};
use crate::domain::market::MarketSnapshot;
use crate::domain::portfolio::Portfolio;

use super::{EPSILON, Evaluator};

#[derive(Debug, Clone, Copy, Default)]
pub struct TakeProfit;

impl Evaluator for TakeProfit {
    fn tag(&self) -> StrategyTag {
        StrategyTag::TakeProfit
    }

    fn evaluate(
        &self,
        portfolio: &Portfolio,
        snapshot: &MarketSnapshot,
        config: &TradingConfig,
    ) -> Option<Decision> {
        let tp = &config.take_profit;
        if !tp.enabled {
            return None;
        }
        let holding = portfolio.holding.as_ref().filter(|h| h.quantity > 0.0)?;

        let osc = snapshot.oscillator;
        let profit = portfolio.profit_fraction(snapshot.price);

        let forecast_fall = snapshot
            .predicted_price
            .is_some_and(|p| p < snapshot.price * (1.0 - tp.emergency_drop));
        if osc > tp.emergency_oscillator && snapshot.trend_signal < 0.0 && forecast_fall {
            return Some(
                Decision::new(
                    Action::SellAll,
                    self.tag(),
                    holding.quantity,
                    format!(
                        "emergency exit: oscillator {:.1}, trend {:.4}, forecast {:.2} vs price {:.2}",
                        osc,
                        snapshot.trend_signal,
                        snapshot.predicted_price.unwrap_or_default(),
                        snapshot.price
                    ),
                )
                .with_confidence(snapshot.direction_confidence),
            );
        }

        if profit + EPSILON >= tp.full_exit_profit && osc > tp.full_exit_oscillator {
            return Some(Decision::new(
                Action::SellAll,
                self.tag(),
                holding.quantity,
                format!(
                    "profit {:.1}% with oscillator {:.1} above {:.1}",
                    profit * 100.0,
                    osc,
                    tp.full_exit_oscillator
                ),
            ));
        }

        if profit + EPSILON >= tp.half_exit_profit && osc > tp.half_exit_oscillator {
            return Some(Decision::new(
                Action::SellHalf,
                self.tag(),
                holding.quantity / 2.0,
                format!(
                    "profit {:.1}% with oscillator {:.1} above {:.1}, locking half",
                    profit * 100.0,
                    osc,
                    tp.half_exit_oscillator
                ),
            ));
        }

        None
    }
}
