//! File report adapter implementing ReportPort.
//!
//! Writes `metrics.json` (metrics, run state, abort reason) and `trades.csv`
//! (one row per recorded step) into the output directory.

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::domain::backtest::{BacktestResult, SimulationState};
use crate::domain::decision::{Action, StrategyTag, TradeRecord};
use crate::domain::error::TradeboxError;
use crate::domain::metrics::Metrics;
use crate::domain::portfolio::PortfolioState;
use crate::ports::report_port::ReportPort;

pub const METRICS_FILE: &str = "metrics.json";
pub const TRADES_FILE: &str = "trades.csv";

pub struct FileReportAdapter;

#[derive(Serialize)]
struct RunReport<'a> {
    state: SimulationState,
    error: Option<String>,
    steps_total: usize,
    steps_recorded: usize,
    warmup_steps: usize,
    metrics: &'a Metrics,
    final_portfolio: PortfolioState,
}

#[derive(Serialize)]
struct TradeRow<'a> {
    timestamp: String,
    action: Action,
    strategy: StrategyTag,
    price: f64,
    amount: f64,
    reason: &'a str,
    entry_price: Option<f64>,
    cash: f64,
    asset_quantity: f64,
    portfolio_value: f64,
    predicted_price: Option<f64>,
    prediction_confidence: Option<f64>,
}

impl<'a> From<&'a TradeRecord> for TradeRow<'a> {
    fn from(r: &'a TradeRecord) -> Self {
        TradeRow {
            timestamp: r.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            action: r.action,
            strategy: r.strategy,
            price: r.price,
            amount: r.amount,
            reason: &r.reason,
            entry_price: r.entry_price,
            cash: r.cash,
            asset_quantity: r.asset_quantity,
            portfolio_value: r.portfolio_value,
            predicted_price: r.prediction.map(|p| p.predicted_price),
            prediction_confidence: r.prediction.map(|p| p.confidence),
        }
    }
}

fn report_err(what: &str, e: impl std::fmt::Display) -> TradeboxError {
    TradeboxError::Report {
        reason: format!("{what}: {e}"),
    }
}

impl ReportPort for FileReportAdapter {
    fn write(
        &self,
        result: &BacktestResult,
        metrics: &Metrics,
        output_dir: &Path,
    ) -> Result<(), TradeboxError> {
        fs::create_dir_all(output_dir)?;

        let report = RunReport {
            state: result.state,
            error: result.error.as_ref().map(|e| e.to_string()),
            steps_total: result.steps_total,
            steps_recorded: result.history.len(),
            warmup_steps: result.warmup_steps,
            metrics,
            final_portfolio: result.portfolio.snapshot(),
        };
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| report_err("failed to serialize metrics", e))?;
        fs::write(output_dir.join(METRICS_FILE), json)?;

        let trades_path = output_dir.join(TRADES_FILE);
        let mut wtr = csv::Writer::from_path(&trades_path)
            .map_err(|e| report_err(&format!("failed to create {}", trades_path.display()), e))?;
        for record in &result.history {
            wtr.serialize(TradeRow::from(record))
                .map_err(|e| report_err("failed to write trade row", e))?;
        }
        wtr.flush()?;

        tracing::info!(dir = %output_dir.display(), rows = result.history.len(), "report written");
        Ok(())
    }
}
