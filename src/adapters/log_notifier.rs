//! Notification adapter that only logs.

use tracing::info;

use crate::domain::decision::TradeRecord;
use crate::domain::error::TradeboxError;
use crate::ports::notification_port::NotificationPort;

pub struct LogNotifier;

impl NotificationPort for LogNotifier {
    fn notify(&self, record: &TradeRecord) -> Result<(), TradeboxError> {
        info!(
            target: "tradebox::notify",
            timestamp = %record.timestamp,
            action = %record.action,
            strategy = %record.strategy,
            price = record.price,
            amount = record.amount,
            value = record.portfolio_value,
            reason = %record.reason,
            "trade notification"
        );
        Ok(())
    }
}
