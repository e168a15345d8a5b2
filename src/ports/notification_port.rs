//! Trade notification port trait.

use crate::domain::decision::TradeRecord;
use crate::domain::error::TradeboxError;

pub trait NotificationPort: Send + Sync {
    fn notify(&self, record: &TradeRecord) -> Result<(), TradeboxError>;
}
