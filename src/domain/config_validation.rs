//! Configuration resolution.
//!
//! Every setting has a documented default. A missing key takes its default
//! silently; an unparsable or out-of-range value takes its default and leaves
//! a `ConfigInvalid` warning behind. Resolution never fails.

use std::fmt;
use std::ops::RangeInclusive;
use std::time::Duration;

use chrono::TimeDelta;
use tracing::warn;

use crate::domain::config::{
    CircuitBreakerConfig, DcaConfig, LiveSettings, MetricsSettings, PredictionSettings,
    SignalLevels, StopLossConfig, SwingConfig, TakeProfitConfig, TradingConfig,
};
use crate::domain::error::TradeboxError;
use crate::domain::indicator::IndicatorParams;
use crate::ports::config_port::ConfigPort;

#[derive(Debug)]
pub struct ResolvedSettings {
    pub trading: TradingConfig,
    pub indicators: IndicatorParams,
    pub prediction: PredictionSettings,
    pub metrics: MetricsSettings,
    pub live: LiveSettings,
    /// One entry per value that fell back to its default.
    pub warnings: Vec<TradeboxError>,
}

impl Default for ResolvedSettings {
    fn default() -> Self {
        ResolvedSettings {
            trading: TradingConfig::default(),
            indicators: IndicatorParams::default(),
            prediction: PredictionSettings::default(),
            metrics: MetricsSettings::default(),
            live: LiveSettings::default(),
            warnings: Vec::new(),
        }
    }
}

/// Ten years.
pub const MAX_COOLDOWN_HOURS: f64 = 24.0 * 365.0 * 10.0;
/// Upper bound on indicator and forecast periods.
pub const MAX_PERIOD: usize = 10_000;
const MAX_LOOKBACK: usize = 1_000_000;
const MAX_LIVE_SECS: usize = 86_400;

pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

pub fn resolve_settings(config: &dyn ConfigPort) -> ResolvedSettings {
    let mut r = Resolver {
        config,
        warnings: Vec::new(),
    };
    let d = TradingConfig::default();

    let trading = TradingConfig {
        initial_capital: r.double("portfolio", "initial_capital", d.initial_capital, |v| v > 0.0, "must be positive"),
        signals: SignalLevels {
            oversold: r.double("signals", "oversold", d.signals.oversold, in_scale, "must be within 0-100"),
            fear_threshold: r.double("signals", "fear_threshold", d.signals.fear_threshold, in_scale, "must be within 0-100"),
        },
        circuit_breaker: CircuitBreakerConfig {
            enabled: r.boolean("circuit_breaker", "enabled", d.circuit_breaker.enabled),
            drawdown_threshold: r.double(
                "circuit_breaker",
                "drawdown_threshold",
                d.circuit_breaker.drawdown_threshold,
                |v| v > 0.0 && v <= 1.0,
                "must be in (0, 1]",
            ),
            cooldown: {
                let default_hours = d.circuit_breaker.cooldown.num_seconds() as f64 / 3600.0;
                let hours = r.double(
                    "circuit_breaker",
                    "cooldown_hours",
                    default_hours,
                    |v| (0.0..=MAX_COOLDOWN_HOURS).contains(&v),
                    "must be within 0-87600",
                );
                TimeDelta::try_seconds((hours * 3600.0).round() as i64)
                    .unwrap_or(d.circuit_breaker.cooldown)
            },
        },
        stop_loss: StopLossConfig {
            enabled: r.boolean("stop_loss", "enabled", d.stop_loss.enabled),
            multiplier: r.double("stop_loss", "multiplier", d.stop_loss.multiplier, |v| v >= 0.0, "must be non-negative"),
        },
        take_profit: TakeProfitConfig {
            enabled: r.boolean("take_profit", "enabled", d.take_profit.enabled),
            full_exit_profit: r.double("take_profit", "full_exit_profit", d.take_profit.full_exit_profit, |v| v > 0.0, "must be positive"),
            full_exit_oscillator: r.double("take_profit", "full_exit_oscillator", d.take_profit.full_exit_oscillator, in_scale, "must be within 0-100"),
            half_exit_profit: r.double("take_profit", "half_exit_profit", d.take_profit.half_exit_profit, |v| v > 0.0, "must be positive"),
            half_exit_oscillator: r.double("take_profit", "half_exit_oscillator", d.take_profit.half_exit_oscillator, in_scale, "must be within 0-100"),
            emergency_oscillator: r.double("take_profit", "emergency_oscillator", d.take_profit.emergency_oscillator, in_scale, "must be within 0-100"),
            emergency_drop: r.double("take_profit", "emergency_drop", d.take_profit.emergency_drop, |v| (0.0..1.0).contains(&v), "must be in [0, 1)"),
        },
        swing: SwingConfig {
            enabled: r.boolean("swing", "enabled", d.swing.enabled),
            fraction: r.double("swing", "fraction", d.swing.fraction, is_fraction, "must be in (0, 1]"),
            upside_margin: r.double("swing", "upside_margin", d.swing.upside_margin, |v| v >= 0.0, "must be non-negative"),
            min_confidence: r.double("swing", "min_confidence", d.swing.min_confidence, |v| (0.0..=1.0).contains(&v), "must be in [0, 1]"),
        },
        dca: DcaConfig {
            enabled: r.boolean("dca", "enabled", d.dca.enabled),
            fraction: r.double("dca", "fraction", d.dca.fraction, is_fraction, "must be in (0, 1]"),
        },
        min_order_cash: r.double("orders", "min_order_cash", d.min_order_cash, |v| v >= 0.0, "must be non-negative"),
    };

    let indicators = resolve_indicators(&mut r);

    let dp = PredictionSettings::default();
    let prediction = PredictionSettings {
        enabled: r.boolean("prediction", "enabled", dp.enabled),
        lookback: r.count("prediction", "lookback", dp.lookback, 2..=MAX_PERIOD),
        horizon: r.count("prediction", "horizon", dp.horizon, 1..=MAX_PERIOD),
        flat_band: r.double("prediction", "flat_band", dp.flat_band, |v| (0.0..1.0).contains(&v), "must be in [0, 1)"),
    };

    let metrics = MetricsSettings {
        flat_band: prediction.flat_band,
        risk_free_rate: r.double("metrics", "risk_free_rate", 0.0, |v| (0.0..1.0).contains(&v), "must be in [0, 1)"),
        periods_per_year: Some(r.double("metrics", "periods_per_year", 0.0, |v| v >= 0.0, "must be non-negative"))
            .filter(|p| *p > 0.0),
    };

    let dl = LiveSettings::default();
    let live = LiveSettings {
        poll_interval: Duration::from_secs(r.count("live", "poll_interval_secs", dl.poll_interval.as_secs() as usize, 1..=MAX_LIVE_SECS) as u64),
        provider_timeout: Duration::from_secs(r.count("live", "provider_timeout_secs", dl.provider_timeout.as_secs() as usize, 1..=MAX_LIVE_SECS) as u64),
        config_ttl: Duration::from_secs(r.count("live", "config_ttl_secs", dl.config_ttl.as_secs() as usize, 0..=MAX_LIVE_SECS) as u64),
    };

    ResolvedSettings {
        trading,
        indicators,
        prediction,
        metrics,
        live,
        warnings: r.warnings,
    }
}

fn resolve_indicators(r: &mut Resolver<'_>) -> IndicatorParams {
    let d = IndicatorParams::default();
    let mut params = IndicatorParams {
        rsi_period: r.count("indicators", "rsi_period", d.rsi_period, 1..=MAX_PERIOD),
        atr_period: r.count("indicators", "atr_period", d.atr_period, 1..=MAX_PERIOD),
        macd_fast: r.count("indicators", "macd_fast", d.macd_fast, 1..=MAX_PERIOD),
        macd_slow: r.count("indicators", "macd_slow", d.macd_slow, 1..=MAX_PERIOD),
        macd_signal: r.count("indicators", "macd_signal", d.macd_signal, 1..=MAX_PERIOD),
        max_lookback: r.count("indicators", "max_lookback", d.max_lookback, 1..=MAX_LOOKBACK),
    };

    if params.macd_fast >= params.macd_slow {
        r.reject(
            "indicators",
            "macd_fast",
            format!(
                "macd_fast {} must be below macd_slow {}",
                params.macd_fast, params.macd_slow
            ),
        );
        params.macd_fast = d.macd_fast;
        params.macd_slow = d.macd_slow;
    }
    if params.max_lookback < params.warmup() {
        r.reject(
            "indicators",
            "max_lookback",
            format!(
                "max_lookback {} shorter than indicator warmup {}",
                params.max_lookback,
                params.warmup()
            ),
        );
        params.max_lookback = params.warmup().max(d.max_lookback);
    }
    params
}

fn in_scale(v: f64) -> bool {
    (0.0..=100.0).contains(&v)
}

fn is_fraction(v: f64) -> bool {
    v > 0.0 && v <= 1.0
}

struct Resolver<'a> {
    config: &'a dyn ConfigPort,
    warnings: Vec<TradeboxError>,
}

impl Resolver<'_> {
    fn reject(&mut self, section: &str, key: &str, reason: String) {
        warn!(section, key, %reason, "config value rejected, using default");
        self.warnings
            .push(TradeboxError::config_invalid(section, key, reason));
    }

    fn raw(&self, section: &str, key: &str) -> Option<String> {
        self.config
            .get_string(section, key)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn double(
        &mut self,
        section: &str,
        key: &str,
        default: f64,
        valid: impl Fn(f64) -> bool,
        rule: &str,
    ) -> f64 {
        let Some(raw) = self.raw(section, key) else {
            return default;
        };
        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() && valid(v) => v,
            Ok(v) => {
                self.reject(section, key, format!("{v} {rule}"));
                default
            }
            Err(_) => {
                self.reject(section, key, format!("'{raw}' is not a number"));
                default
            }
        }
    }

    fn count(
        &mut self,
        section: &str,
        key: &str,
        default: usize,
        range: RangeInclusive<usize>,
    ) -> usize {
        let Some(raw) = self.raw(section, key) else {
            return default;
        };
        match raw.parse::<i64>() {
            Ok(v) if usize::try_from(v).is_ok_and(|v| range.contains(&v)) => v as usize,
            Ok(v) => {
                self.reject(
                    section,
                    key,
                    format!("{v} must be within {}-{}", range.start(), range.end()),
                );
                default
            }
            Err(_) => {
                self.reject(section, key, format!("'{raw}' is not an integer"));
                default
            }
        }
    }

    fn boolean(&mut self, section: &str, key: &str, default: bool) -> bool {
        let Some(raw) = self.raw(section, key) else {
            return default;
        };
        parse_bool(&raw).unwrap_or_else(|| {
            self.reject(section, key, format!("'{raw}' is not a boolean"));
            default
        })
    }
}

impl fmt::Display for ResolvedSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = &self.trading;
        writeln!(f, "[portfolio]\ninitial_capital = {}", t.initial_capital)?;
        writeln!(
            f,
            "[signals]\noversold = {}\nfear_threshold = {}",
            t.signals.oversold, t.signals.fear_threshold
        )?;
        writeln!(
            f,
            "[circuit_breaker]\nenabled = {}\ndrawdown_threshold = {}\ncooldown_hours = {}",
            t.circuit_breaker.enabled,
            t.circuit_breaker.drawdown_threshold,
            t.circuit_breaker.cooldown.num_seconds() as f64 / 3600.0
        )?;
        writeln!(
            f,
            "[stop_loss]\nenabled = {}\nmultiplier = {}",
            t.stop_loss.enabled, t.stop_loss.multiplier
        )?;
        let tp = &t.take_profit;
        writeln!(
            f,
            "[take_profit]\nenabled = {}\nfull_exit_profit = {}\nfull_exit_oscillator = {}\n\
             half_exit_profit = {}\nhalf_exit_oscillator = {}\nemergency_oscillator = {}\nemergency_drop = {}",
            tp.enabled,
            tp.full_exit_profit,
            tp.full_exit_oscillator,
            tp.half_exit_profit,
            tp.half_exit_oscillator,
            tp.emergency_oscillator,
            tp.emergency_drop
        )?;
        writeln!(
            f,
            "[swing]\nenabled = {}\nfraction = {}\nupside_margin = {}\nmin_confidence = {}",
            t.swing.enabled, t.swing.fraction, t.swing.upside_margin, t.swing.min_confidence
        )?;
        writeln!(f, "[dca]\nenabled = {}\nfraction = {}", t.dca.enabled, t.dca.fraction)?;
        writeln!(f, "[orders]\nmin_order_cash = {}", t.min_order_cash)?;
        let i = &self.indicators;
        writeln!(
            f,
            "[indicators]\nrsi_period = {}\natr_period = {}\nmacd_fast = {}\nmacd_slow = {}\nmacd_signal = {}\nmax_lookback = {}",
            i.rsi_period, i.atr_period, i.macd_fast, i.macd_slow, i.macd_signal, i.max_lookback
        )?;
        let p = &self.prediction;
        writeln!(
            f,
            "[prediction]\nenabled = {}\nlookback = {}\nhorizon = {}\nflat_band = {}",
            p.enabled, p.lookback, p.horizon, p.flat_band
        )?;
        writeln!(
            f,
            "[metrics]\nrisk_free_rate = {}\nperiods_per_year = {}",
            self.metrics.risk_free_rate,
            self.metrics.periods_per_year.unwrap_or(0.0)
        )?;
        write!(
            f,
            "[live]\npoll_interval_secs = {}\nprovider_timeout_secs = {}\nconfig_ttl_secs = {}",
            self.live.poll_interval.as_secs(),
            self.live.provider_timeout.as_secs(),
            self.live.config_ttl.as_secs()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapConfig(HashMap<(String, String), String>);

    impl MapConfig {
        fn new(entries: &[(&str, &str, &str)]) -> Self {
            MapConfig(
                entries
                    .iter()
                    .map(|(s, k, v)| ((s.to_string(), k.to_string()), v.to_string()))
                    .collect(),
            )
        }
    }

    impl ConfigPort for MapConfig {
        fn get_string(&self, section: &str, key: &str) -> Option<String> {
            self.0.get(&(section.to_string(), key.to_string())).cloned()
        }
        fn get_int(&self, _: &str, _: &str, default: i64) -> i64 {
            default
        }
        fn get_double(&self, _: &str, _: &str, default: f64) -> f64 {
            default
        }
        fn get_bool(&self, _: &str, _: &str, default: bool) -> bool {
            default
        }
    }

    #[test]
    fn empty_config_is_all_defaults() {
        let s = resolve_settings(&MapConfig::new(&[]));
        assert_eq!(s.trading, TradingConfig::default());
        assert_eq!(s.indicators, IndicatorParams::default());
        assert_eq!(s.prediction, PredictionSettings::default());
        assert!(s.metrics.periods_per_year.is_none());
        assert!(s.warnings.is_empty());
    }

    #[test]
    fn valid_values_are_taken() {
        let s = resolve_settings(&MapConfig::new(&[
            ("portfolio", "initial_capital", "25000"),
            ("signals", "oversold", "25"),
            ("circuit_breaker", "cooldown_hours", "24"),
            ("dca", "enabled", "no"),
            ("indicators", "rsi_period", "7"),
            ("metrics", "periods_per_year", "252"),
        ]));
        assert!(s.warnings.is_empty());
        assert_eq!(s.trading.initial_capital, 25_000.0);
        assert_eq!(s.trading.signals.oversold, 25.0);
        assert_eq!(s.trading.circuit_breaker.cooldown, TimeDelta::hours(24));
        assert!(!s.trading.dca.enabled);
        assert_eq!(s.indicators.rsi_period, 7);
        assert_eq!(s.metrics.periods_per_year, Some(252.0));
    }

    #[test]
    fn out_of_range_falls_back_with_warning() {
        let s = resolve_settings(&MapConfig::new(&[
            ("swing", "fraction", "1.5"),
            ("circuit_breaker", "drawdown_threshold", "-0.2"),
        ]));
        assert_eq!(s.trading.swing.fraction, 0.25);
        assert_eq!(s.trading.circuit_breaker.drawdown_threshold, 0.75);
        assert_eq!(s.warnings.len(), 2);
        assert!(
            s.warnings
                .iter()
                .all(|w| matches!(w, TradeboxError::ConfigInvalid { .. }))
        );
    }

    #[test]
    fn garbage_falls_back_with_warning() {
        let s = resolve_settings(&MapConfig::new(&[
            ("stop_loss", "multiplier", "two"),
            ("take_profit", "enabled", "maybe"),
            ("indicators", "atr_period", "0"),
        ]));
        assert_eq!(s.trading.stop_loss.multiplier, 2.0);
        assert!(s.trading.take_profit.enabled);
        assert_eq!(s.indicators.atr_period, 14);
        assert_eq!(s.warnings.len(), 3);
    }

    #[test]
    fn huge_cooldown_falls_back() {
        for raw in ["1e10", "1e13", "inf"] {
            let s = resolve_settings(&MapConfig::new(&[("circuit_breaker", "cooldown_hours", raw)]));
            assert_eq!(
                s.trading.circuit_breaker.cooldown,
                TradingConfig::default().circuit_breaker.cooldown
            );
            assert_eq!(s.warnings.len(), 1, "cooldown_hours = {raw}");
        }
        let s = resolve_settings(&MapConfig::new(&[(
            "circuit_breaker",
            "cooldown_hours",
            "87600",
        )]));
        assert!(s.warnings.is_empty());
        assert_eq!(s.trading.circuit_breaker.cooldown, TimeDelta::hours(87_600));
    }

    #[test]
    fn huge_periods_fall_back() {
        let s = resolve_settings(&MapConfig::new(&[
            ("indicators", "macd_slow", "9223372036854775807"),
            ("indicators", "macd_signal", "10001"),
            ("prediction", "lookback", "-3"),
        ]));
        assert_eq!(s.indicators.macd_slow, 26);
        assert_eq!(s.indicators.macd_signal, 9);
        assert_eq!(s.prediction.lookback, 30);
        assert_eq!(s.warnings.len(), 3);
        assert_eq!(s.indicators.warmup(), 34);
    }

    #[test]
    fn forecast_band_is_shared_with_metrics() {
        let s = resolve_settings(&MapConfig::new(&[("prediction", "flat_band", "0.01")]));
        assert_eq!(s.metrics.flat_band, 0.01);
        assert_eq!(
            ResolvedSettings::default().metrics.flat_band,
            PredictionSettings::default().flat_band
        );
    }

    #[test]
    fn inverted_macd_resets_pair() {
        let s = resolve_settings(&MapConfig::new(&[
            ("indicators", "macd_fast", "30"),
            ("indicators", "macd_slow", "10"),
        ]));
        assert_eq!(s.indicators.macd_fast, 12);
        assert_eq!(s.indicators.macd_slow, 26);
        assert_eq!(s.warnings.len(), 1);
    }

    #[test]
    fn short_lookback_is_raised() {
        let s = resolve_settings(&MapConfig::new(&[("indicators", "max_lookback", "5")]));
        assert!(s.indicators.max_lookback >= s.indicators.warmup());
        assert_eq!(s.warnings.len(), 1);
    }

    #[test]
    fn display_round_trips_through_resolution() {
        let shown = ResolvedSettings::default().to_string();
        assert!(shown.contains("[take_profit]"));
        assert!(shown.contains("cooldown_hours = 168"));
    }

    #[test]
    fn parse_bool_variants() {
        assert_eq!(parse_bool("Yes"), Some(true));
        assert_eq!(parse_bool(" off "), Some(false));
        assert_eq!(parse_bool("2"), None);
    }
}
