//! Linear-trend forecaster.
//!
//! Fits an ordinary least squares line to the most recent closes of the
//! training slice and projects its slope `horizon` steps past the current
//! price. Confidence is 0.5 + 0.5·R², so a perfect fit reads 1.0 and noise
//! hovers near 0.5.

use crate::domain::config::PredictionSettings;
use crate::domain::error::TradeboxError;
use crate::domain::market::{Direction, MarketSnapshot, Prediction};
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::market_port::PredictionPort;

const MIN_POINTS: usize = 3;

pub struct TrendPredictor {
    settings: PredictionSettings,
}

impl TrendPredictor {
    pub fn new(settings: PredictionSettings) -> Self {
        Self { settings }
    }
}

struct LineFit {
    slope: f64,
    r_squared: f64,
}

fn fit_line(ys: &[f64]) -> LineFit {
    let n = ys.len() as f64;
    let mean_x = (n - 1.0) / 2.0;
    let mean_y = ys.iter().sum::<f64>() / n;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for (i, &y) in ys.iter().enumerate() {
        let dx = i as f64 - mean_x;
        sxy += dx * (y - mean_y);
        sxx += dx * dx;
    }
    let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };

    let ss_tot: f64 = ys.iter().map(|y| (y - mean_y).powi(2)).sum();
    let ss_res: f64 = ys
        .iter()
        .enumerate()
        .map(|(i, &y)| {
            let fitted = mean_y + slope * (i as f64 - mean_x);
            (y - fitted).powi(2)
        })
        .sum();
    // A perfectly flat window carries no trend information.
    let r_squared = if ss_tot > 0.0 {
        (1.0 - ss_res / ss_tot).clamp(0.0, 1.0)
    } else {
        0.0
    };

    LineFit { slope, r_squared }
}

impl PredictionPort for TrendPredictor {
    fn predict(
        &self,
        training: &[OhlcvBar],
        current: &MarketSnapshot,
    ) -> Result<Option<Prediction>, TradeboxError> {
        if !self.settings.enabled {
            return Ok(None);
        }
        if let Some(last) = training.last() {
            if last.timestamp >= current.timestamp {
                return Err(TradeboxError::Provider {
                    reason: format!(
                        "training data reaches {} but forecast is for {}",
                        last.timestamp, current.timestamp
                    ),
                });
            }
        }

        let n = self.settings.lookback.min(training.len());
        if n < MIN_POINTS {
            return Ok(None);
        }
        let closes: Vec<f64> = training[training.len() - n..]
            .iter()
            .map(|b| b.close)
            .collect();

        let fit = fit_line(&closes);
        let predicted_price = current.price + fit.slope * self.settings.horizon as f64;
        if !predicted_price.is_finite() || predicted_price <= 0.0 {
            return Ok(None);
        }

        Ok(Some(Prediction {
            predicted_price,
            direction: Direction::of_move(current.price, predicted_price, self.settings.flat_band),
            confidence: 0.5 + 0.5 * fit.r_squared,
            horizon: self.settings.horizon,
        }))
    }
}
