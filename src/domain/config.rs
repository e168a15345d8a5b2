//! Typed settings for the decision engine and its collaborators.
//!
//! Each struct maps to one INI section; `Default` carries the documented defaults.

use chrono::TimeDelta;

#[derive(Debug, Clone, PartialEq)]
pub struct SignalLevels {
    /// Oscillator reading below which the market counts as oversold.
    pub oversold: f64,
    /// Sentiment reading below which the market counts as fearful.
    pub fear_threshold: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CircuitBreakerConfig {
    pub enabled: bool,
    /// Pause when portfolio value < drawdown_threshold * initial_capital.
    pub drawdown_threshold: f64,
    pub cooldown: TimeDelta,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StopLossConfig {
    pub enabled: bool,
    pub multiplier: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TakeProfitConfig {
    pub enabled: bool,
    pub full_exit_profit: f64,
    pub full_exit_oscillator: f64,
    pub half_exit_profit: f64,
    pub half_exit_oscillator: f64,
    pub emergency_oscillator: f64,
    /// Forecast drop below price, as a fraction, that counts as a predicted fall.
    pub emergency_drop: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwingConfig {
    pub enabled: bool,
    pub fraction: f64,
    pub upside_margin: f64,
    pub min_confidence: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DcaConfig {
    pub enabled: bool,
    pub fraction: f64,
}

/// Everything the evaluators and executor read. Immutable for a run.
#[derive(Debug, Clone, PartialEq)]
pub struct TradingConfig {
    pub initial_capital: f64,
    pub signals: SignalLevels,
    pub circuit_breaker: CircuitBreakerConfig,
    pub stop_loss: StopLossConfig,
    pub take_profit: TakeProfitConfig,
    pub swing: SwingConfig,
    pub dca: DcaConfig,
    /// Buys smaller than this are not emitted.
    pub min_order_cash: f64,
}

impl Default for TradingConfig {
    fn default() -> Self {
        TradingConfig {
            initial_capital: 10_000.0,
            signals: SignalLevels {
                oversold: 30.0,
                fear_threshold: 40.0,
            },
            circuit_breaker: CircuitBreakerConfig {
                enabled: true,
                drawdown_threshold: 0.75,
                cooldown: TimeDelta::hours(168),
            },
            stop_loss: StopLossConfig {
                enabled: true,
                multiplier: 2.0,
            },
            take_profit: TakeProfitConfig {
                enabled: true,
                full_exit_profit: 0.15,
                full_exit_oscillator: 65.0,
                half_exit_profit: 0.10,
                half_exit_oscillator: 70.0,
                emergency_oscillator: 75.0,
                emergency_drop: 0.05,
            },
            swing: SwingConfig {
                enabled: true,
                fraction: 0.25,
                upside_margin: 0.03,
                min_confidence: 0.70,
            },
            dca: DcaConfig {
                enabled: true,
                fraction: 0.10,
            },
            min_order_cash: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionSettings {
    pub enabled: bool,
    /// Closes used to fit the trend line.
    pub lookback: usize,
    pub horizon: usize,
    /// Relative move treated as flat when classifying direction.
    pub flat_band: f64,
}

impl Default for PredictionSettings {
    fn default() -> Self {
        PredictionSettings {
            enabled: true,
            lookback: 30,
            horizon: 1,
            flat_band: 0.002,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSettings {
    /// Annual rate, spread evenly over the periods of a year.
    pub risk_free_rate: f64,
    /// None means infer from the spacing of the history.
    pub periods_per_year: Option<f64>,
    /// Relative dead zone for calling a realized move flat; the forecaster's band.
    pub flat_band: f64,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        MetricsSettings {
            risk_free_rate: 0.0,
            periods_per_year: None,
            flat_band: PredictionSettings::default().flat_band,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiveSettings {
    pub poll_interval: std::time::Duration,
    pub provider_timeout: std::time::Duration,
    pub config_ttl: std::time::Duration,
}

impl Default for LiveSettings {
    fn default() -> Self {
        LiveSettings {
            poll_interval: std::time::Duration::from_secs(300),
            provider_timeout: std::time::Duration::from_secs(10),
            config_ttl: std::time::Duration::from_secs(300),
        }
    }
}
