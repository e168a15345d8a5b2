//! Snapshot and forecast provider ports.
//!
//! Implementations only ever see the slice they are handed, so causality is
//! decided by the caller.

use crate::domain::error::TradeboxError;
use crate::domain::market::{MarketSnapshot, Prediction};
use crate::domain::ohlcv::OhlcvBar;

pub trait SnapshotPort: Send + Sync {
    /// Bars needed before `snapshot` can return a reading.
    fn warmup(&self) -> usize;

    /// Snapshot for the last bar of `window`, or `None` while history is too short.
    fn snapshot(&self, window: &[OhlcvBar]) -> Result<Option<MarketSnapshot>, TradeboxError>;
}

pub trait PredictionPort: Send + Sync {
    /// Forecast for the step described by `current`, fit on `training` only.
    ///
    /// `training` ends strictly before `current.timestamp`.
    fn predict(
        &self,
        training: &[OhlcvBar],
        current: &MarketSnapshot,
    ) -> Result<Option<Prediction>, TradeboxError>;
}
