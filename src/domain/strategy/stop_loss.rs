use crate::domain::config::TradingConfig;
use crate::domain::decision::{Action, Decision, StrategyTag};
use crate::domain::market::MarketSnapshot;
use crate::domain::portfolio::Portfolio;

use super::Evaluator;

/// Sells the whole holding once price drops a volatility-scaled distance
/// below the average entry price. Uses the volatility of the current step.
#[derive(Debug, Clone, Copy, Default)]
pub struct StopLoss;

impl Evaluator for StopLoss {
    fn tag(&self) -> StrategyTag {
        StrategyTag::StopLoss
    }

    fn evaluate(
        &self,
        portfolio: &Portfolio,
        snapshot: &MarketSnapshot,
        config: &TradingConfig,
    ) -> Option<Decision> {
        if !config.stop_loss.enabled {
            return None;
        }
        let holding = portfolio.holding.as_ref().filter(|h| h.quantity > 0.0)?;

        let stop = holding.average_entry_price - config.stop_loss.multiplier * snapshot.volatility;
        if snapshot.price >= stop {
            return None;
        }

        Some(Decision::new(
            Action::SellAll,
            self.tag(),
            holding.quantity,
            format!(
                "price {:.2} below stop {:.2} (entry {:.2} - {} x volatility {:.2})",
                snapshot.price,
                stop,
                holding.average_entry_price,
                config.stop_loss.multiplier,
                snapshot.volatility
            ),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::MarketSnapshot;
    use crate::domain::strategy::fixtures::*;

    fn with_vol(price: f64, volatility: f64) -> MarketSnapshot {
        MarketSnapshot {
            volatility,
            ..snapshot(price)
        }
    }

    #[test]
    fn boundary_is_not_a_stop() {
        let p = holding(9_000.0, 0.0111, 95_000.0);
        // 90000 < 95000 - 2 * 2500 is false
        assert!(
            StopLoss
                .evaluate(&p, &with_vol(90_000.0, 2_500.0), &TradingConfig::default())
                .is_none()
        );
    }

    #[test]
    fn fires_just_below_boundary() {
        let p = holding(9_000.0, 0.0111, 95_000.0);
        let d = StopLoss
            .evaluate(&p, &with_vol(89_999.0, 2_500.0), &TradingConfig::default())
            .unwrap();
        assert_eq!(d.action, Action::SellAll);
        assert!((d.amount - 0.0111).abs() < f64::EPSILON);
    }

    #[test]
    fn no_holding_no_signal() {
        assert!(
            StopLoss
                .evaluate(&flat(10_000.0), &with_vol(1.0, 100.0), &TradingConfig::default())
                .is_none()
        );
    }

    #[test]
    fn zero_volatility_stops_below_entry() {
        let p = holding(0.0, 1.0, 100.0);
        let config = TradingConfig::default();
        assert!(StopLoss.evaluate(&p, &with_vol(99.99, 0.0), &config).is_some());
        assert!(StopLoss.evaluate(&p, &with_vol(100.0, 0.0), &config).is_none());
    }
}
