//! INI file configuration adapter.

use std::path::{Path, PathBuf};

use configparser::ini::Ini;

use crate::domain::config_validation::{ResolvedSettings, parse_bool, resolve_settings};
use crate::domain::error::TradeboxError;
use crate::ports::config_port::{ConfigPort, ConfigSource};

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TradeboxError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config.load(path).map_err(|reason| TradeboxError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, TradeboxError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| TradeboxError::ConfigParse {
                file: "<string>".into(),
                reason,
            })?;
        Ok(Self { config })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_deref()
            .and_then(parse_bool)
            .unwrap_or(default)
    }
}

/// Re-reads and resolves an INI file on every load.
pub struct IniFileSource {
    path: PathBuf,
}

impl IniFileSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl ConfigSource for IniFileSource {
    fn load(&self) -> Result<ResolvedSettings, TradeboxError> {
        let adapter = FileConfigAdapter::from_file(&self.path)?;
        Ok(resolve_settings(&adapter))
    }
}
