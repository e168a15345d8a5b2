//! Historical data access port trait.

use chrono::NaiveDate;

use crate::domain::error::TradeboxError;
use crate::domain::ohlcv::OhlcvBar;

pub trait DataPort {
    /// Bars in ascending time order, optionally limited to an inclusive date range.
    fn fetch_ohlcv(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<OhlcvBar>, TradeboxError>;
}
