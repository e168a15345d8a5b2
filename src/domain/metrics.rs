//! Performance metrics computed from the recorded step history.
//!
//! Nothing here re-runs the simulation: every figure is a pure function of
//! the records and the initial capital.

use serde::Serialize;

use super::config::MetricsSettings;
use super::decision::TradeRecord;
use super::market::Direction;

const SECONDS_PER_YEAR: f64 = 365.25 * 86_400.0;
const FALLBACK_PERIODS_PER_YEAR: f64 = 365.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    pub total_return: f64,
    pub buy_and_hold_return: f64,
    pub outperformance: f64,
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub win_rate: f64,
    /// Gross sell gains over gross sell losses; None while no sell has lost.
    pub profit_factor: Option<f64>,
    /// Annualized return over max drawdown; None without a drawdown.
    pub calmar_ratio: Option<f64>,
    /// Share of forecasts whose direction matched the realized move.
    pub forecast_accuracy: Option<f64>,
    pub price_rmse: Option<f64>,
    pub forecast_samples: usize,
    pub final_value: f64,
    pub total_trades: usize,
    pub sell_trades: usize,
    pub avg_sell_return: f64,
    pub periods_per_year: f64,
}

impl Metrics {
    pub fn compute(history: &[TradeRecord], initial_capital: f64, settings: &MetricsSettings) -> Self {
        let final_value = history
            .last()
            .map(|r| r.portfolio_value)
            .unwrap_or(initial_capital);

        let total_return = if initial_capital > 0.0 {
            (final_value - initial_capital) / initial_capital
        } else {
            0.0
        };

        let buy_and_hold_return = match (history.first(), history.last()) {
            (Some(first), Some(last)) if first.price > 0.0 => last.price / first.price - 1.0,
            _ => 0.0,
        };

        let periods_per_year = settings
            .periods_per_year
            .filter(|p| *p > 0.0)
            .unwrap_or_else(|| infer_periods_per_year(history));

        let values: Vec<f64> = history.iter().map(|r| r.portfolio_value).collect();
        let rf_per_period = settings.risk_free_rate / periods_per_year;
        let (sharpe_ratio, sortino_ratio) =
            compute_risk_adjusted(&values, rf_per_period, periods_per_year);

        let sell_returns: Vec<f64> = history
            .iter()
            .filter(|r| r.action.is_sell())
            .filter_map(|r| r.entry_price.filter(|e| *e > 0.0).map(|entry| r.price / entry - 1.0))
            .collect();
        let wins = sell_returns.iter().filter(|r| **r > 0.0).count();
        let (win_rate, avg_sell_return) = if sell_returns.is_empty() {
            (0.0, 0.0)
        } else {
            let n = sell_returns.len() as f64;
            (wins as f64 / n, sell_returns.iter().sum::<f64>() / n)
        };

        let gains: f64 = sell_returns.iter().filter(|r| **r > 0.0).sum();
        let losses: f64 = -sell_returns.iter().filter(|r| **r < 0.0).sum::<f64>();
        let profit_factor = (losses > 0.0).then(|| gains / losses);

        let max_drawdown = compute_drawdown(&values);
        let calmar_ratio = (max_drawdown > 0.0)
            .then(|| annualize_return(total_return, history.len() as f64 / periods_per_year))
            .flatten()
            .map(|annual| annual / max_drawdown);

        let forecast = forecast_stats(history, settings.flat_band);

        Metrics {
            total_return,
            buy_and_hold_return,
            outperformance: total_return - buy_and_hold_return,
            max_drawdown,
            sharpe_ratio,
            sortino_ratio,
            win_rate,
            profit_factor,
            calmar_ratio,
            forecast_accuracy: forecast.accuracy,
            price_rmse: forecast.rmse,
            forecast_samples: forecast.samples,
            final_value,
            total_trades: history.iter().filter(|r| r.action.is_trade()).count(),
            sell_trades: sell_returns.len(),
            avg_sell_return,
            periods_per_year,
        }
    }
}

/// Largest peak-to-trough decline as a positive fraction of the peak.
fn compute_drawdown(values: &[f64]) -> f64 {
    let Some(&first) = values.first() else {
        return 0.0;
    };

    let mut peak = first;
    let mut max_dd = 0.0_f64;
    for &v in values {
        if v > peak {
            peak = v;
        } else if peak > 0.0 {
            max_dd = max_dd.max((peak - v) / peak);
        }
    }
    max_dd
}

/// Compound `total_return` earned over `years` down to a yearly rate.
fn annualize_return(total_return: f64, years: f64) -> Option<f64> {
    let growth = 1.0 + total_return;
    if years <= 0.0 || growth < 0.0 {
        return None;
    }
    Some(growth.powf(1.0 / years) - 1.0)
}

/// Sample statistics (n - 1), so fewer than two returns give zero.
fn compute_risk_adjusted(values: &[f64], rf_per_period: f64, periods_per_year: f64) -> (f64, f64) {
    if values.len() < 3 {
        return (0.0, 0.0);
    }

    let returns: Vec<f64> = values
        .windows(2)
        .map(|w| if w[0] > 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
        .collect();

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let stddev = variance.sqrt();
    let excess = mean - rf_per_period;
    let annualize = periods_per_year.sqrt();

    let sharpe = if stddev > 0.0 {
        excess / stddev * annualize
    } else {
        0.0
    };

    let downside = returns
        .iter()
        .filter(|&&r| r < rf_per_period)
        .map(|&r| (r - rf_per_period).powi(2))
        .sum::<f64>()
        / (n - 1.0);
    let sortino = if downside > 0.0 {
        excess / downside.sqrt() * annualize
    } else {
        0.0
    };

    (sharpe, sortino)
}

/// Periods per year implied by the median spacing between records.
fn infer_periods_per_year(history: &[TradeRecord]) -> f64 {
    let mut gaps: Vec<i64> = history
        .windows(2)
        .map(|w| (w[1].timestamp - w[0].timestamp).num_seconds())
        .filter(|s| *s > 0)
        .collect();
    if gaps.is_empty() {
        return FALLBACK_PERIODS_PER_YEAR;
    }
    gaps.sort_unstable();
    let median = gaps[gaps.len() / 2] as f64;
    SECONDS_PER_YEAR / median
}

struct ForecastStats {
    accuracy: Option<f64>,
    rmse: Option<f64>,
    samples: usize,
}

/// Each forecast made at step i is scored against the price at i + horizon.
/// The realized move is classified with the same flat band the forecaster uses.
fn forecast_stats(history: &[TradeRecord], flat_band: f64) -> ForecastStats {
    let mut hits = 0usize;
    let mut samples = 0usize;
    let mut squared_error = 0.0;

    for (i, record) in history.iter().enumerate() {
        let Some(prediction) = record.prediction else {
            continue;
        };
        let Some(realized) = history.get(i + prediction.horizon.max(1)) else {
            continue;
        };

        if prediction.direction == Direction::of_move(record.price, realized.price, flat_band) {
            hits += 1;
        }
        squared_error += (prediction.predicted_price - realized.price).powi(2);
        samples += 1;
    }

    if samples == 0 {
        return ForecastStats {
            accuracy: None,
            rmse: None,
            samples,
        };
    }
    ForecastStats {
        accuracy: Some(hits as f64 / samples as f64),
        rmse: Some((squared_error / samples as f64).sqrt()),
        samples,
    }
}
