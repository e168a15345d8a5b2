//! Live quote port trait.

use crate::domain::error::TradeboxError;
use crate::domain::ohlcv::OhlcvBar;

pub trait QuotePort: Send + Sync {
    /// Newest bar the feed knows about, if any.
    fn latest(&self) -> Result<Option<OhlcvBar>, TradeboxError>;
}
