//! Paper-trading loop.
//!
//! Each cycle polls the quote feed, appends a new bar to the causal buffer,
//! and runs the same decide/execute path as the backtest. Provider calls run
//! on the blocking pool under a timeout; a slow or failing provider costs the
//! cycle, not the loop. Only an infeasible decision or a lookahead stops it.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::adapters::config_cache::ConfigCache;
use crate::domain::decision::TradeRecord;
use crate::domain::error::TradeboxError;
use crate::domain::execution::{execute, release_expired_pause};
use crate::domain::market::{MarketSnapshot, Prediction};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::orchestrator::Orchestrator;
use crate::domain::portfolio::{Portfolio, PortfolioState};
use crate::ports::market_port::{PredictionPort, SnapshotPort};
use crate::ports::notification_port::NotificationPort;
use crate::ports::quote_port::QuotePort;

#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// The feed had nothing newer than the last processed bar.
    Stale,
    /// A provider failed or timed out; nothing was decided.
    Skipped(String),
    /// Not enough history for a snapshot yet.
    Warmup,
    Decided(TradeRecord),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LiveSummary {
    pub cycles: usize,
    pub decisions: usize,
    pub trades: usize,
    pub skipped: usize,
    pub stale: usize,
}

pub struct LiveTrader {
    quotes: Arc<dyn QuotePort>,
    snapshots: Arc<dyn SnapshotPort>,
    predictor: Option<Arc<dyn PredictionPort>>,
    notifier: Arc<dyn NotificationPort>,
    config: Arc<ConfigCache>,
    orchestrator: Orchestrator,
    portfolio: Portfolio,
    bars: Vec<OhlcvBar>,
    last_seen: Option<NaiveDateTime>,
}

/// Run `f` on the blocking pool, giving up after `limit`.
///
/// A call that times out keeps running in the background; its result is dropped.
pub async fn call_blocking<T, F>(provider: &str, limit: Duration, f: F) -> Result<T, TradeboxError>
where
    F: FnOnce() -> Result<T, TradeboxError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::time::timeout(limit, tokio::task::spawn_blocking(f)).await {
        Ok(Ok(result)) => result,
        Ok(Err(join)) => Err(TradeboxError::Provider {
            reason: format!("{provider} task failed: {join}"),
        }),
        Err(_) => Err(TradeboxError::ProviderTimeout {
            provider: provider.to_string(),
            millis: limit.as_millis() as u64,
        }),
    }
}

impl LiveTrader {
    pub fn new(
        quotes: Arc<dyn QuotePort>,
        snapshots: Arc<dyn SnapshotPort>,
        notifier: Arc<dyn NotificationPort>,
        config: Arc<ConfigCache>,
    ) -> Self {
        let initial_capital = config.snapshot().trading.initial_capital;
        LiveTrader {
            quotes,
            snapshots,
            predictor: None,
            notifier,
            config,
            orchestrator: Orchestrator::default(),
            portfolio: Portfolio::new(initial_capital),
            bars: Vec::new(),
            last_seen: None,
        }
    }

    pub fn with_predictor(mut self, predictor: Arc<dyn PredictionPort>) -> Self {
        self.predictor = Some(predictor);
        self
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn state(&self) -> PortfolioState {
        self.portfolio.snapshot()
    }

    pub async fn cycle(&mut self) -> Result<CycleOutcome, TradeboxError> {
        let settings = self.config.get();
        let limit = settings.live.provider_timeout;

        let quotes = Arc::clone(&self.quotes);
        let bar = match call_blocking("quote", limit, move || quotes.latest()).await {
            Ok(Some(bar)) => bar,
            Ok(None) => return Ok(CycleOutcome::Stale),
            Err(e) => return Ok(skip("quote", e)),
        };
        if self.last_seen.is_some_and(|seen| bar.timestamp <= seen) {
            debug!(timestamp = %bar.timestamp, "no new bar");
            return Ok(CycleOutcome::Stale);
        }
        let step = self.bars.len();
        if let Err(e) = bar.validate(step) {
            self.last_seen = Some(bar.timestamp);
            return Ok(skip("quote", e));
        }

        self.last_seen = Some(bar.timestamp);
        self.bars.push(bar.clone());
        let keep = settings
            .indicators
            .max_lookback
            .max(settings.prediction.lookback + 1);
        if self.bars.len() > keep {
            self.bars.drain(..self.bars.len() - keep);
        }
        self.portfolio = release_expired_pause(&self.portfolio, bar.timestamp);

        let snapshots = Arc::clone(&self.snapshots);
        let window = self.bars.clone();
        let snapshot =
            match call_blocking("snapshot", limit, move || snapshots.snapshot(&window)).await {
                Ok(Some(s)) => s,
                Ok(None) => return Ok(CycleOutcome::Warmup),
                Err(e) => return Ok(skip("snapshot", e)),
            };
        if snapshot.timestamp != bar.timestamp {
            return Err(TradeboxError::LookaheadViolation {
                step,
                snapshot: snapshot.timestamp,
                observed: bar.timestamp,
            });
        }
        if let Err(e) = snapshot.validate(step) {
            return Ok(skip("snapshot", e));
        }

        let prediction = self.predict(&snapshot, limit).await;
        let snapshot = snapshot.with_prediction(prediction.as_ref());

        let decision = self
            .orchestrator
            .decide(&self.portfolio, &snapshot, &settings.trading);
        debug!(
            timestamp = %snapshot.timestamp,
            action = %decision.action,
            strategy = %decision.strategy,
            reason = %decision.reason,
            "decision"
        );

        let (next, mut record) = execute(
            &self.portfolio,
            &decision,
            snapshot.price,
            snapshot.timestamp,
            &settings.trading,
        )?;
        record.prediction = prediction;
        self.portfolio = next;

        if record.action.is_trade() {
            info!(
                action = %record.action,
                strategy = %record.strategy,
                price = record.price,
                amount = record.amount,
                value = record.portfolio_value,
                "paper trade executed"
            );
            self.dispatch_notification(record.clone(), limit);
        }
        Ok(CycleOutcome::Decided(record))
    }

    async fn predict(
        &self,
        snapshot: &MarketSnapshot,
        limit: Duration,
    ) -> Option<Prediction> {
        let predictor = Arc::clone(self.predictor.as_ref()?);
        let training = self.bars[..self.bars.len().saturating_sub(1)].to_vec();
        let current = snapshot.clone();
        match call_blocking("prediction", limit, move || predictor.predict(&training, &current)).await {
            Ok(Some(p)) if p.is_usable() => Some(p),
            Ok(Some(p)) => {
                warn!(?p, "discarding unusable prediction");
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "prediction unavailable");
                None
            }
        }
    }

    /// Fire-and-forget; a failed or slow delivery is only logged.
    fn dispatch_notification(&self, record: TradeRecord, limit: Duration) {
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            if let Err(e) = call_blocking("notification", limit, move || notifier.notify(&record)).await {
                warn!(error = %e, "notification failed");
            }
        });
    }

    /// Poll until `shutdown` flips to true (or its sender goes away), or
    /// until `max_cycles` cycles have run.
    pub async fn run(
        &mut self,
        mut shutdown: watch::Receiver<bool>,
        max_cycles: Option<usize>,
    ) -> Result<LiveSummary, TradeboxError> {
        let mut summary = LiveSummary::default();
        info!(max_cycles = ?max_cycles, "live loop started");

        loop {
            if *shutdown.borrow() || max_cycles.is_some_and(|m| summary.cycles >= m) {
                break;
            }

            let outcome = match self.cycle().await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(error = %e, cycles = summary.cycles, "live loop stopped");
                    return Err(e);
                }
            };
            summary.cycles += 1;
            match outcome {
                CycleOutcome::Stale => summary.stale += 1,
                CycleOutcome::Skipped(_) => summary.skipped += 1,
                CycleOutcome::Warmup => {}
                CycleOutcome::Decided(record) => {
                    summary.decisions += 1;
                    if record.action.is_trade() {
                        summary.trades += 1;
                    }
                }
            }

            if max_cycles.is_some_and(|m| summary.cycles >= m) {
                break;
            }
            let interval = self.config.snapshot().live.poll_interval;
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!(
            cycles = summary.cycles,
            trades = summary.trades,
            skipped = summary.skipped,
            cash = self.portfolio.cash,
            "live loop finished"
        );
        Ok(summary)
    }
}

fn skip(provider: &str, e: TradeboxError) -> CycleOutcome {
    warn!(provider, error = %e, "cycle skipped");
    CycleOutcome::Skipped(e.to_string())
}
