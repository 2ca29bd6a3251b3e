//! Configuration access port trait.

use crate::domain::error::SignaltraderError;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    /// Number at `[section] key`. Absent keys give `default`; a present value
    /// that does not parse is an error, never the default.
    fn get_double(&self, section: &str, key: &str, default: f64) -> Result<f64, SignaltraderError> {
        let Some(raw) = self.get_string(section, key) else {
            return Ok(default);
        };
        raw.trim()
            .parse()
            .map_err(|_| SignaltraderError::ConfigInvalid {
                section: section.to_string(),
                key: key.to_string(),
                reason: format!("not a number: '{}'", raw.trim()),
            })
    }

    /// Comma-separated list, trimmed and uppercased, empty items dropped.
    fn get_list(&self, section: &str, key: &str) -> Option<Vec<String>> {
        self.get_string(section, key).map(|raw| {
            raw.split(',')
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .collect()
        })
    }
}
