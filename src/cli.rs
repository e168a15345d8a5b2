//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::file_report_adapter::FileReportAdapter;
use crate::adapters::indicator_snapshot::IndicatorSnapshotProvider;
use crate::adapters::trend_predictor::TrendPredictor;
use crate::domain::backtest::{BacktestResult, WalkForwardSimulator};
use crate::domain::config_validation::{ResolvedSettings, resolve_settings};
use crate::domain::error::TradeboxError;
use crate::domain::metrics::Metrics;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(
    name = "tradebox",
    about = "Rule-based trading decision engine with walk-forward backtesting"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a walk-forward backtest over a CSV price history
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data: PathBuf,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(short, long, default_value = "report")]
        output_dir: PathBuf,
        /// Run without the trend forecaster
        #[arg(long)]
        no_prediction: bool,
    },
    /// Print the resolved settings and every fallback warning
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Paper-trade against a CSV feed that another process appends to
    #[cfg(feature = "live")]
    Live {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        feed: PathBuf,
        /// Stop after this many polling cycles
        #[arg(long)]
        cycles: Option<usize>,
        /// Write the final portfolio state here as JSON
        #[arg(long)]
        state_out: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            data,
            start,
            end,
            output_dir,
            no_prediction,
        } => run_backtest(&config, &data, start, end, &output_dir, !no_prediction),
        Command::Validate { config } => run_validate(&config),
        #[cfg(feature = "live")]
        Command::Live {
            config,
            feed,
            cycles,
            state_out,
        } => run_live(&config, &feed, cycles, state_out.as_deref()),
    }
}

pub fn load_settings(path: &Path) -> Result<ResolvedSettings, ExitCode> {
    let adapter = FileConfigAdapter::from_file(path).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })?;
    let settings = resolve_settings(&adapter);
    for warning in &settings.warnings {
        eprintln!("warning: {warning} (using default)");
    }
    Ok(settings)
}

/// Load, simulate and score. An aborted run is still returned; only a data
/// load failure is an error here.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    settings: &ResolvedSettings,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    use_prediction: bool,
) -> Result<(BacktestResult, Metrics), TradeboxError> {
    let bars = data_port.fetch_ohlcv(start, end)?;

    let snapshots = IndicatorSnapshotProvider::new(settings.indicators);
    let predictor = TrendPredictor::new(settings.prediction.clone());
    let mut simulator = WalkForwardSimulator::new(&snapshots, settings.trading.clone());
    if use_prediction && settings.prediction.enabled {
        simulator = simulator.with_predictor(&predictor);
    }

    let result = simulator.run(&bars);
    let metrics = Metrics::compute(
        &result.history,
        settings.trading.initial_capital,
        &settings.metrics,
    );
    Ok((result, metrics))
}

fn run_backtest(
    config_path: &Path,
    data_path: &Path,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    output_dir: &Path,
    use_prediction: bool,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let settings = match load_settings(config_path) {
        Ok(s) => s,
        Err(code) => return code,
    };

    eprintln!("Loading price history from {}", data_path.display());
    let data_port = CsvAdapter::new(data_path.to_path_buf());
    let (result, metrics) =
        match run_backtest_pipeline(&data_port, &settings, start, end, use_prediction) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };

    print_summary(&result, &metrics);

    if let Err(e) = FileReportAdapter.write(&result, &metrics, output_dir) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    eprintln!("\nReport written to: {}", output_dir.display());

    match &result.error {
        Some(e) => {
            eprintln!("error: {e}");
            e.into()
        }
        None => ExitCode::SUCCESS,
    }
}

fn print_summary(result: &BacktestResult, metrics: &Metrics) {
    eprintln!("\n=== Backtest Results ===");
    eprintln!(
        "Steps:            {} of {} ({} warmup)",
        result.history.len(),
        result.steps_total,
        result.warmup_steps
    );
    eprintln!("Final Value:      {:.2}", metrics.final_value);
    eprintln!("Total Return:     {:.2}%", metrics.total_return * 100.0);
    eprintln!("Buy & Hold:       {:.2}%", metrics.buy_and_hold_return * 100.0);
    eprintln!("Outperformance:   {:+.2}%", metrics.outperformance * 100.0);
    eprintln!("Sharpe Ratio:     {:.2}", metrics.sharpe_ratio);
    eprintln!("Sortino Ratio:    {:.2}", metrics.sortino_ratio);
    eprintln!("Max Drawdown:     -{:.1}%", metrics.max_drawdown * 100.0);
    eprintln!("Trades:           {}", metrics.total_trades);
    eprintln!("Win Rate:         {:.1}%", metrics.win_rate * 100.0);
    eprintln!("Profit Factor:    {}", ratio_or_na(metrics.profit_factor));
    eprintln!("Calmar Ratio:     {}", ratio_or_na(metrics.calmar_ratio));
    match metrics.forecast_accuracy {
        Some(acc) => eprintln!(
            "Forecast Acc.:    {:.1}% over {} forecasts",
            acc * 100.0,
            metrics.forecast_samples
        ),
        None => eprintln!("Forecast Acc.:    n/a"),
    }
}

fn ratio_or_na(ratio: Option<f64>) -> String {
    ratio.map_or_else(|| "n/a".to_string(), |r| format!("{r:.2}"))
}

fn run_validate(config_path: &Path) -> ExitCode {
    let settings = match load_settings(config_path) {
        Ok(s) => s,
        Err(code) => return code,
    };
    println!("{settings}");
    if settings.warnings.is_empty() {
        eprintln!("\nConfig validated successfully");
    } else {
        eprintln!(
            "\nConfig loaded with {} value(s) replaced by defaults",
            settings.warnings.len()
        );
    }
    ExitCode::SUCCESS
}

#[cfg(feature = "live")]
fn run_live(
    config_path: &Path,
    feed_path: &Path,
    cycles: Option<usize>,
    state_out: Option<&Path>,
) -> ExitCode {
    use std::sync::Arc;

    use crate::adapters::config_cache::ConfigCache;
    use crate::adapters::csv_tail_feed::CsvTailFeed;
    use crate::adapters::file_config_adapter::IniFileSource;
    use crate::adapters::log_notifier::LogNotifier;
    use crate::live::LiveTrader;

    let settings = match load_settings(config_path) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let source = IniFileSource::new(config_path.to_path_buf());
    let cache = match ConfigCache::new(Box::new(source), settings.live.config_ttl) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            let err = TradeboxError::Io(e);
            eprintln!("error: {err}");
            return (&err).into();
        }
    };

    let mut trader = LiveTrader::new(
        Arc::new(CsvTailFeed::new(feed_path.to_path_buf())),
        Arc::new(IndicatorSnapshotProvider::new(settings.indicators)),
        Arc::new(LogNotifier),
        cache,
    );
    if settings.prediction.enabled {
        trader = trader.with_predictor(Arc::new(TrendPredictor::new(settings.prediction.clone())));
    }

    eprintln!(
        "Paper trading on {} every {}s",
        feed_path.display(),
        settings.live.poll_interval.as_secs()
    );
    let outcome = runtime.block_on(async {
        let (tx, rx) = tokio::sync::watch::channel(false);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = tx.send(true);
            }
        });
        trader.run(rx, cycles).await
    });

    if let Some(path) = state_out {
        let written = serde_json::to_string_pretty(&trader.state())
            .map_err(|e| TradeboxError::Report {
                reason: format!("failed to serialize state: {e}"),
            })
            .and_then(|json| std::fs::write(path, json).map_err(TradeboxError::from));
        if let Err(e) = written {
            eprintln!("error: {e}");
            return (&e).into();
        }
    }

    match outcome {
        Ok(summary) => {
            eprintln!(
                "\nLive loop finished: {} cycles, {} trades, {} skipped",
                summary.cycles, summary.trades, summary.skipped
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}
