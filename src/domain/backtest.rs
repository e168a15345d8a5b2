//! Walk-forward backtest engine.
//!
//! At step `t` the snapshot provider sees bars `[0, t]` and the predictor is
//! fit on bars `[0, t)`. Steps run strictly in order and past records are
//! never revisited.

use tracing::{debug, error, info, warn};

use super::config::TradingConfig;
use super::decision::{Decision, TradeRecord};
use super::error::TradeboxError;
use super::execution::{execute, release_expired_pause};
use super::market::{MarketSnapshot, Prediction};
use super::ohlcv::OhlcvBar;
use super::orchestrator::Orchestrator;
use super::portfolio::Portfolio;
use crate::ports::market_port::{PredictionPort, SnapshotPort};

pub const INSUFFICIENT_HISTORY: &str = "insufficient history";

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationState {
    Initializing,
    Running,
    Completed,
    /// Stopped on a fatal error; history up to the failing step is kept.
    Aborted,
}

#[derive(Debug)]
pub struct BacktestResult {
    pub state: SimulationState,
    pub history: Vec<TradeRecord>,
    pub portfolio: Portfolio,
    pub error: Option<TradeboxError>,
    /// Steps held because indicators could not be computed yet.
    pub warmup_steps: usize,
    pub steps_total: usize,
}

impl BacktestResult {
    pub fn is_complete(&self) -> bool {
        self.state == SimulationState::Completed
    }
}

pub struct WalkForwardSimulator<'a> {
    snapshots: &'a dyn SnapshotPort,
    predictor: Option<&'a dyn PredictionPort>,
    orchestrator: Orchestrator,
    config: TradingConfig,
    state: SimulationState,
}

impl<'a> WalkForwardSimulator<'a> {
    pub fn new(snapshots: &'a dyn SnapshotPort, config: TradingConfig) -> Self {
        WalkForwardSimulator {
            snapshots,
            predictor: None,
            orchestrator: Orchestrator::default(),
            config,
            state: SimulationState::Initializing,
        }
    }

    pub fn with_predictor(mut self, predictor: &'a dyn PredictionPort) -> Self {
        self.predictor = Some(predictor);
        self
    }

    pub fn with_orchestrator(mut self, orchestrator: Orchestrator) -> Self {
        self.orchestrator = orchestrator;
        self
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    pub fn run(&mut self, bars: &[OhlcvBar]) -> BacktestResult {
        self.state = SimulationState::Running;
        info!(
            steps = bars.len(),
            warmup = self.snapshots.warmup(),
            initial_capital = self.config.initial_capital,
            "backtest started"
        );

        let mut portfolio = Portfolio::new(self.config.initial_capital);
        let mut history = Vec::with_capacity(bars.len());
        let mut warmup_steps = 0;

        for t in 0..bars.len() {
            match self.step(bars, t, &portfolio) {
                Ok(StepOutcome { next, record, warmup }) => {
                    if warmup {
                        warmup_steps += 1;
                    }
                    portfolio = next;
                    history.push(record);
                }
                Err(e) => {
                    self.state = SimulationState::Aborted;
                    error!(step = t, error = %e, "backtest aborted");
                    return BacktestResult {
                        state: self.state,
                        history,
                        portfolio,
                        error: Some(e),
                        warmup_steps,
                        steps_total: bars.len(),
                    };
                }
            }
        }

        self.state = SimulationState::Completed;
        info!(
            steps = history.len(),
            warmup_steps,
            final_value = history.last().map_or(portfolio.cash, |r| r.portfolio_value),
            "backtest completed"
        );
        BacktestResult {
            state: self.state,
            history,
            portfolio,
            error: None,
            warmup_steps,
            steps_total: bars.len(),
        }
    }

    fn step(
        &self,
        bars: &[OhlcvBar],
        t: usize,
        portfolio: &Portfolio,
    ) -> Result<StepOutcome, TradeboxError> {
        let bar = &bars[t];
        bar.validate(t)?;
        if let Some(prev) = t.checked_sub(1).map(|i| &bars[i]) {
            if bar.timestamp <= prev.timestamp {
                return Err(TradeboxError::MalformedRecord {
                    step: t,
                    reason: format!(
                        "timestamp {} does not follow {}",
                        bar.timestamp, prev.timestamp
                    ),
                });
            }
        }

        let portfolio = release_expired_pause(portfolio, bar.timestamp);
        let window = &bars[..=t];

        let snapshot = if window.len() < self.snapshots.warmup() {
            None
        } else {
            self.snapshots.snapshot(window)?
        };
        let Some(snapshot) = snapshot else {
            let (next, record) = execute(
                &portfolio,
                &Decision::hold(INSUFFICIENT_HISTORY),
                bar.close,
                bar.timestamp,
                &self.config,
            )?;
            return Ok(StepOutcome {
                next,
                record,
                warmup: true,
            });
        };

        if snapshot.timestamp != bar.timestamp {
            return Err(TradeboxError::LookaheadViolation {
                step: t,
                snapshot: snapshot.timestamp,
                observed: bar.timestamp,
            });
        }
        snapshot.validate(t)?;

        let prediction = self.predict(&bars[..t], &snapshot, t);
        let snapshot = snapshot.with_prediction(prediction.as_ref());

        let decision = self.orchestrator.decide(&portfolio, &snapshot, &self.config);
        debug!(
            step = t,
            timestamp = %snapshot.timestamp,
            price = snapshot.price,
            action = %decision.action,
            strategy = %decision.strategy,
            reason = %decision.reason,
            "decision"
        );

        let (next, mut record) = execute(
            &portfolio,
            &decision,
            snapshot.price,
            snapshot.timestamp,
            &self.config,
        )?;
        record.prediction = prediction;
        if decision.action.is_trade() {
            debug!(
                step = t,
                action = %record.action,
                amount = record.amount,
                value = record.portfolio_value,
                "trade executed"
            );
        }
        Ok(StepOutcome {
            next,
            record,
            warmup: false,
        })
    }

    /// Forecast failures only cost the step its forecast.
    fn predict(
        &self,
        training: &[OhlcvBar],
        snapshot: &MarketSnapshot,
        t: usize,
    ) -> Option<Prediction> {
        let predictor = self.predictor?;
        match predictor.predict(training, snapshot) {
            Ok(Some(p)) if p.is_usable() => Some(p),
            Ok(Some(p)) => {
                warn!(step = t, ?p, "discarding unusable prediction");
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!(step = t, error = %e, "prediction failed");
                None
            }
        }
    }
}

struct StepOutcome {
    next: Portfolio,
    record: TradeRecord,
    warmup: bool,
}
