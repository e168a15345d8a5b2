//! Time-bounded cache over a [`ConfigSource`].
//!
//! Readers always get a complete `Arc` snapshot. Only one caller reloads at a
//! time; everyone else keeps reading the previous snapshot meanwhile.

use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::domain::config_validation::ResolvedSettings;
use crate::domain::error::TradeboxError;
use crate::ports::config_port::ConfigSource;

pub struct ConfigCache {
    source: Box<dyn ConfigSource>,
    ttl: Duration,
    current: RwLock<Arc<ResolvedSettings>>,
    /// Time of the last load attempt. Holding the lock is the refresh right.
    refreshed_at: Mutex<Instant>,
}

impl ConfigCache {
    /// Load once up front; a source that cannot be read at start is an error.
    pub fn new(source: Box<dyn ConfigSource>, ttl: Duration) -> Result<Self, TradeboxError> {
        let initial = source.load()?;
        Ok(Self {
            source,
            ttl,
            current: RwLock::new(Arc::new(initial)),
            refreshed_at: Mutex::new(Instant::now()),
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The cached settings, reloaded first if the TTL has run out.
    pub fn get(&self) -> Arc<ResolvedSettings> {
        if let Ok(mut refreshed_at) = self.refreshed_at.try_lock() {
            if refreshed_at.elapsed() >= self.ttl {
                *refreshed_at = Instant::now();
                self.reload();
            }
        }
        self.snapshot()
    }

    /// The cached settings without considering the TTL.
    pub fn snapshot(&self) -> Arc<ResolvedSettings> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn reload(&self) {
        match self.source.load() {
            Ok(settings) => {
                debug!(warnings = settings.warnings.len(), "config reloaded");
                *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(settings);
            }
            Err(e) => warn!(error = %e, "config reload failed, keeping previous settings"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingSource {
        loads: Arc<AtomicUsize>,
        failing: Arc<AtomicBool>,
    }

    impl ConfigSource for CountingSource {
        fn load(&self) -> Result<ResolvedSettings, TradeboxError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(TradeboxError::ConfigParse {
                    file: "test.ini".into(),
                    reason: "unreadable".into(),
                });
            }
            let n = self.loads.fetch_add(1, Ordering::SeqCst) + 1;
            let mut settings = ResolvedSettings::default();
            settings.trading.initial_capital = n as f64;
            Ok(settings)
        }
    }

    #[test]
    fn fresh_cache_does_not_reload() {
        let source = CountingSource::default();
        let loads = source.loads.clone();
        let cache = ConfigCache::new(Box::new(source), Duration::from_secs(3600)).unwrap();
        for _ in 0..5 {
            assert_eq!(cache.get().trading.initial_capital, 1.0);
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn expired_cache_reloads() {
        let source = CountingSource::default();
        let loads = source.loads.clone();
        let cache = ConfigCache::new(Box::new(source), Duration::ZERO).unwrap();
        assert_eq!(cache.get().trading.initial_capital, 2.0);
        assert_eq!(cache.get().trading.initial_capital, 3.0);
        assert_eq!(loads.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn failed_reload_keeps_previous() {
        let source = CountingSource::default();
        let failing = source.failing.clone();
        let cache = ConfigCache::new(Box::new(source), Duration::ZERO).unwrap();
        failing.store(true, Ordering::SeqCst);
        assert_eq!(cache.get().trading.initial_capital, 1.0);
        failing.store(false, Ordering::SeqCst);
        assert_eq!(cache.get().trading.initial_capital, 2.0);
    }

    #[test]
    fn initial_failure_is_error() {
        let source = CountingSource::default();
        source.failing.store(true, Ordering::SeqCst);
        assert!(ConfigCache::new(Box::new(source), Duration::ZERO).is_err());
    }

    #[test]
    fn readers_keep_old_snapshot() {
        let source = CountingSource::default();
        let cache = ConfigCache::new(Box::new(source), Duration::ZERO).unwrap();
        let held = cache.snapshot();
        let _ = cache.get();
        assert_eq!(held.trading.initial_capital, 1.0);
        assert_eq!(cache.snapshot().trading.initial_capital, 2.0);
    }
}
