//! tradebox: rule-based trading decision engine and walk-forward backtester.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`]. The paper-trading loop in
//! [`live`] sits behind the `live` feature.

pub mod adapters;
pub mod cli;
pub mod domain;
#[cfg(feature = "live")]
pub mod live;
pub mod ports;
