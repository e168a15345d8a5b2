//! Domain error types.

use chrono::NaiveDateTime;

use super::decision::Action;

/// Top-level error type for tradebox.
#[derive(Debug, thiserror::Error)]
pub enum TradeboxError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("no price data in {path}")]
    NoData { path: String },

    #[error("malformed record at step {step}: {reason}")]
    MalformedRecord { step: usize, reason: String },

    #[error("lookahead at step {step}: snapshot stamped {snapshot} but step observed {observed}")]
    LookaheadViolation {
        step: usize,
        snapshot: NaiveDateTime,
        observed: NaiveDateTime,
    },

    #[error("infeasible {action} decision: {reason}")]
    InfeasibleDecision { action: Action, reason: String },

    #[error("{provider} provider timed out after {millis}ms")]
    ProviderTimeout { provider: String, millis: u64 },

    #[error("provider error: {reason}")]
    Provider { reason: String },

    #[error("notification failed: {reason}")]
    Notification { reason: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TradeboxError {
    pub fn config_invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        TradeboxError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// Errors that abort a backtest rather than degrade a single step.
    pub fn is_fatal_to_run(&self) -> bool {
        matches!(
            self,
            TradeboxError::MalformedRecord { .. }
                | TradeboxError::LookaheadViolation { .. }
                | TradeboxError::InfeasibleDecision { .. }
        )
    }
}

impl From<&TradeboxError> for std::process::ExitCode {
    fn from(err: &TradeboxError) -> Self {
        let code: u8 = match err {
            TradeboxError::Io(_) | TradeboxError::Report { .. } => 1,
            TradeboxError::ConfigParse { .. } | TradeboxError::ConfigInvalid { .. } => 2,
            TradeboxError::Data { .. }
            | TradeboxError::NoData { .. }
            | TradeboxError::MalformedRecord { .. } => 3,
            TradeboxError::InfeasibleDecision { .. } | TradeboxError::LookaheadViolation { .. } => {
                4
            }
            TradeboxError::ProviderTimeout { .. }
            | TradeboxError::Provider { .. }
            | TradeboxError::Notification { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
