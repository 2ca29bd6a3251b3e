//! INI file configuration adapter.
//!
//! Sections are `[backtest]`, `[model]` and `[data]`. Keys are
//! case-insensitive; values are returned trimmed.

use crate::domain::error::SignaltraderError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
    source: String,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SignaltraderError> {
        let source = path.as_ref().display().to_string();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| SignaltraderError::ConfigParse {
                file: source.clone(),
                reason,
            })?;
        Ok(Self { config, source })
    }

    pub fn from_string(content: &str) -> Result<Self, SignaltraderError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| SignaltraderError::ConfigParse {
                file: "<string>".into(),
                reason,
            })?;
        Ok(Self {
            config,
            source: "<string>".into(),
        })
    }

    /// Where the configuration was read from, for messages.
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config
            .get(section, key)
            .map(|v| v.trim().to_string())
    }
}
