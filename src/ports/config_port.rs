//! Configuration access port traits.

use crate::domain::config_validation::ResolvedSettings;
use crate::domain::error::TradeboxError;

/// Section/key lookups over a raw configuration store.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;
}

/// Somewhere fully resolved settings can be (re)loaded from.
pub trait ConfigSource: Send + Sync {
    fn load(&self) -> Result<ResolvedSettings, TradeboxError>;
}
