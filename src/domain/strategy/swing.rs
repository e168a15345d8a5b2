use crate::domain::config::TradingConfig;
use crate::domain::decision::{Action, Decision, StrategyTag};
use crate::domain::market::MarketSnapshot;
use crate::domain::portfolio::Portfolio;

use super::{Evaluator, buy_amount};

/// High-conviction entry: oversold, trend turning up and a confident
/// forecast of a move above the margin. All four must hold.
#[derive(Debug, Clone, Copy, Default)]
pub struct SwingEntry;

impl Evaluator for SwingEntry {
    fn tag(&self) -> StrategyTag {
        StrategyTag::Swing
    }

    fn evaluate(
        &self,
        portfolio: &Portfolio,
        snapshot: &MarketSnapshot,
        config: &TradingConfig,
    ) -> Option<Decision> {
        let swing = &config.swing;
        if !swing.enabled {
            return None;
        }
        let predicted = snapshot.predicted_price?;
        let confidence = snapshot.direction_confidence?;

        let oversold = snapshot.oscillator < config.signals.oversold;
        let trending_up = snapshot.trend_signal > 0.0;
        let upside = predicted > snapshot.price * (1.0 + swing.upside_margin);
        let confident = confidence > swing.min_confidence;
        if !(oversold && trending_up && upside && confident) {
            return None;
        }

        let amount = buy_amount(portfolio.cash, swing.fraction, config.min_order_cash)?;
        Some(
            Decision::new(
                Action::Buy,
                self.tag(),
                amount,
                format!(
                    "oscillator {:.1} oversold, trend {:.4} rising, forecast {:.2} vs price {:.2}",
                    snapshot.oscillator, snapshot.trend_signal, predicted, snapshot.price
                ),
            )
            .with_confidence(Some(confidence)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::strategy::fixtures::*;

    fn setup() -> MarketSnapshot {
        MarketSnapshot {
            oscillator: 25.0,
            trend_signal: 0.3,
            predicted_price: Some(105.0),
            direction_confidence: Some(0.8),
            ..snapshot(100.0)
        }
    }

    #[test]
    fn fires_when_all_conditions_hold() {
        let d = SwingEntry
            .evaluate(&flat(10_000.0), &setup(), &TradingConfig::default())
            .unwrap();
        assert_eq!(d.action, Action::Buy);
        assert_eq!(d.strategy, StrategyTag::Swing);
        assert!((d.amount - 2_500.0).abs() < f64::EPSILON);
        assert_eq!(d.confidence, Some(0.8));
    }

    #[test]
    fn each_condition_is_required() {
        let config = TradingConfig::default();
        let p = flat(10_000.0);
        let variants = [
            MarketSnapshot {
                oscillator: 30.0,
                ..setup()
            },
            MarketSnapshot {
                trend_signal: 0.0,
                ..setup()
            },
            MarketSnapshot {
                predicted_price: Some(103.0),
                ..setup()
            },
            MarketSnapshot {
                direction_confidence: Some(0.70),
                ..setup()
            },
        ];
        for s in &variants {
            assert!(SwingEntry.evaluate(&p, s, &config).is_none(), "{:?}", s);
        }
    }

    #[test]
    fn no_forecast_no_swing() {
        let s = setup().with_prediction(None);
        assert!(
            SwingEntry
                .evaluate(&flat(10_000.0), &s, &TradingConfig::default())
                .is_none()
        );
    }

    #[test]
    fn too_little_cash() {
        assert!(
            SwingEntry
                .evaluate(&flat(20.0), &setup(), &TradingConfig::default())
                .is_none()
        );
    }
}
