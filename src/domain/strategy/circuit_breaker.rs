use crate::domain::config::TradingConfig;
use crate::domain::decision::{Action, Decision, StrategyTag};
use crate::domain::market::MarketSnapshot;
use crate::domain::portfolio::Portfolio;

use super::Evaluator;

/// Pauses trading once portfolio value falls below a fraction of initial capital.
///
/// The cooldown itself is enforced by the orchestrator, not here.
#[derive(Debug, Clone, Copy, Default)]
pub struct CircuitBreaker;

impl Evaluator for CircuitBreaker {
    fn tag(&self) -> StrategyTag {
        StrategyTag::CircuitBreaker
    }

    fn evaluate(
        &self,
        portfolio: &Portfolio,
        snapshot: &MarketSnapshot,
        config: &TradingConfig,
    ) -> Option<Decision> {
        let cb = &config.circuit_breaker;
        if !cb.enabled {
            return None;
        }

        let value = portfolio.value(snapshot.price);
        let floor = cb.drawdown_threshold * portfolio.initial_capital;
        if value >= floor {
            return None;
        }

        Some(Decision::new(
            Action::Pause,
            self.tag(),
            0.0,
            format!(
                "portfolio value {:.2} below {:.0}% of initial capital {:.2}",
                value,
                cb.drawdown_threshold * 100.0,
                portfolio.initial_capital
            ),
        ))
    }
}
