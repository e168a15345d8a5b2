//! Port traits for the collaborators the engine talks to.

pub mod config_port;
pub mod data_port;
pub mod market_port;
pub mod notification_port;
pub mod quote_port;
pub mod report_port;
