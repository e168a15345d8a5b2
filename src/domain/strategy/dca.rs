use crate::domain::config::TradingConfig;
use crate::domain::decision::{Action, Decision, StrategyTag};
use crate::domain::market::MarketSnapshot;
use crate::domain::portfolio::Portfolio;

use super::{Evaluator, buy_amount};

/// Fallback accumulation: buys a small slice of cash when the market is
/// oversold or fearful.
#[derive(Debug, Clone, Copy, Default)]
pub struct DcaEntry;

impl Evaluator for DcaEntry {
    fn tag(&self) -> StrategyTag {
        StrategyTag::Dca
    }

    fn evaluate(
        &self,
        portfolio: &Portfolio,
        snapshot: &MarketSnapshot,
        config: &TradingConfig,
    ) -> Option<Decision> {
        if !config.dca.enabled {
            return None;
        }

        let levels = &config.signals;
        let mut triggers = Vec::with_capacity(2);
        if snapshot.oscillator < levels.oversold {
            triggers.push(format!("oscillator {:.1} below {:.1}", snapshot.oscillator, levels.oversold));
        }
        if snapshot.sentiment < levels.fear_threshold {
            triggers.push(format!(
                "sentiment {:.1} below {:.1}",
                snapshot.sentiment, levels.fear_threshold
            ));
        }
        if triggers.is_empty() {
            return None;
        }

        let amount = buy_amount(portfolio.cash, config.dca.fraction, config.min_order_cash)?;
        Some(Decision::new(
            Action::Buy,
            self.tag(),
            amount,
            triggers.join("; "),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::strategy::fixtures::*;

    #[test]
    fn oversold_and_fearful() {
        let s = MarketSnapshot {
            oscillator: 28.0,
            sentiment: 35.0,
            ..snapshot(90_000.0)
        };
        let d = DcaEntry
            .evaluate(&flat(10_000.0), &s, &TradingConfig::default())
            .unwrap();
        assert_eq!(d.action, Action::Buy);
        assert_eq!(d.strategy, StrategyTag::Dca);
        assert!((d.amount - 1_000.0).abs() < f64::EPSILON);
        assert!(d.reason.contains("oscillator"));
        assert!(d.reason.contains("sentiment"));
    }

    #[test]
    fn fear_alone_is_enough() {
        let s = MarketSnapshot {
            sentiment: 20.0,
            ..snapshot(100.0)
        };
        assert!(DcaEntry.evaluate(&flat(10_000.0), &s, &TradingConfig::default()).is_some());
    }

    #[test]
    fn neutral_market_no_signal() {
        assert!(
            DcaEntry
                .evaluate(&flat(10_000.0), &snapshot(100.0), &TradingConfig::default())
                .is_none()
        );
    }

    #[test]
    fn below_minimum_order() {
        let s = MarketSnapshot {
            oscillator: 10.0,
            ..snapshot(100.0)
        };
        assert!(DcaEntry.evaluate(&flat(99.0), &s, &TradingConfig::default()).is_none());
    }

    #[test]
    fn idempotent() {
        let s = MarketSnapshot {
            oscillator: 10.0,
            ..snapshot(100.0)
        };
        let p = flat(5_000.0);
        let config = TradingConfig::default();
        assert_eq!(DcaEntry.evaluate(&p, &s, &config), DcaEntry.evaluate(&p, &s, &config));
    }
}
