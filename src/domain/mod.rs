//! Core domain types and logic: strategies, execution, simulation, metrics.

pub mod backtest;
pub mod config;
pub mod config_validation;
pub mod decision;
pub mod error;
pub mod execution;
pub mod indicator;
pub mod market;
pub mod metrics;
pub mod ohlcv;
pub mod orchestrator;
pub mod portfolio;
pub mod position;
pub mod strategy;
