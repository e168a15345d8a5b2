//! First-match fold over the evaluator chain.

use chrono::NaiveDateTime;

use super::config::TradingConfig;
use super::decision::{Action, Decision, StrategyTag};
use super::market::MarketSnapshot;
use super::portfolio::Portfolio;
use super::strategy::{self, Evaluator};

pub struct Orchestrator {
    evaluators: Vec<Box<dyn Evaluator>>,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Orchestrator::new(strategy::default_chain())
    }
}

impl Orchestrator {
    pub fn new(evaluators: Vec<Box<dyn Evaluator>>) -> Self {
        Orchestrator { evaluators }
    }

    /// The decision for one step.
    ///
    /// An active pause short-circuits to a Hold before any evaluator runs.
    pub fn decide(
        &self,
        portfolio: &Portfolio,
        snapshot: &MarketSnapshot,
        config: &TradingConfig,
    ) -> Decision {
        if portfolio.is_paused_at(snapshot.timestamp) {
            return Decision::new(
                Action::Hold,
                StrategyTag::CircuitBreaker,
                0.0,
                cooldown_reason(portfolio.pause_until),
            );
        }

        self.evaluators
            .iter()
            .find_map(|e| e.evaluate(portfolio, snapshot, config))
            .unwrap_or_else(|| Decision::hold("no strategy signal"))
    }
}

fn cooldown_reason(until: Option<NaiveDateTime>) -> String {
    match until {
        Some(t) => format!("circuit breaker cooldown until {t}"),
        None => "circuit breaker cooldown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::position::Holding;
    use chrono::{NaiveDate, TimeDelta};

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 2, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn stop_loss_beats_dca() {
        let p = Portfolio {
            cash: 5_000.0,
            holding: Some(Holding::new(0.1, 50_000.0)),
            ..Portfolio::new(10_000.0)
        };
        let s = MarketSnapshot {
            oscillator: 20.0,
            sentiment: 10.0,
            volatility: 1_000.0,
            ..MarketSnapshot::neutral(ts(), 47_000.0)
        };
        let d = Orchestrator::default().decide(&p, &s, &TradingConfig::default());
        assert_eq!(d.strategy, StrategyTag::StopLoss);
        assert_eq!(d.action, Action::SellAll);
    }

    #[test]
    fn paused_portfolio_holds() {
        let p = Portfolio {
            paused: true,
            pause_until: Some(ts() + TimeDelta::hours(1)),
            ..Portfolio::new(10_000.0)
        };
        let s = MarketSnapshot {
            oscillator: 5.0,
            ..MarketSnapshot::neutral(ts(), 100.0)
        };
        let d = Orchestrator::default().decide(&p, &s, &TradingConfig::default());
        assert_eq!(d.action, Action::Hold);
        assert_eq!(d.strategy, StrategyTag::CircuitBreaker);
    }

    #[test]
    fn nothing_fires_is_hold() {
        let d = Orchestrator::default().decide(
            &Portfolio::new(10_000.0),
            &MarketSnapshot::neutral(ts(), 100.0),
            &TradingConfig::default(),
        );
        assert_eq!(d, Decision::hold("no strategy signal"));
    }

    #[test]
    fn empty_chain_holds() {
        let s = MarketSnapshot {
            oscillator: 5.0,
            ..MarketSnapshot::neutral(ts(), 100.0)
        };
        let d = Orchestrator::new(Vec::new()).decide(
            &Portfolio::new(10_000.0),
            &s,
            &TradingConfig::default(),
        );
        assert_eq!(d.action, Action::Hold);
    }
}
