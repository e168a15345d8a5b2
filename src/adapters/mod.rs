//! Concrete adapter implementations for ports.

pub mod config_cache;
pub mod csv_adapter;
pub mod csv_tail_feed;
pub mod file_config_adapter;
pub mod file_report_adapter;
pub mod indicator_snapshot;
pub mod log_notifier;
pub mod trend_predictor;
