//! Configuration validation.
//!
//! Validates all config fields before a backtest runs. Bad dates surface here
//! as fatal calendar errors; a start date after the end date is accepted and
//! simply produces an empty run.

use crate::domain::calendar::parse_date;
use crate::domain::error::SignaltraderError;
use crate::domain::metrics::DEFAULT_RISK_FREE_RATE;
use crate::ports::config_port::ConfigPort;
use std::collections::HashSet;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), SignaltraderError> {
    validate_initial_capital(config)?;
    validate_margin_requirement(config)?;
    validate_risk_free_rate(config)?;
    validate_dates(config)?;
    validate_tickers(config)?;
    Ok(())
}

/// Checks the `[data]` section needed by the replay oracle.
pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), SignaltraderError> {
    for key in ["prices_dir", "decisions"] {
        match config.get_string("data", key) {
            Some(s) if !s.trim().is_empty() => {}
            _ => {
                return Err(SignaltraderError::ConfigMissing {
                    section: "data".to_string(),
                    key: key.to_string(),
                });
            }
        }
    }
    Ok(())
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), SignaltraderError> {
    let value = config.get_double("backtest", "initial_capital", 100_000.0)?;
    if !value.is_finite() || value <= 0.0 {
        return Err(SignaltraderError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "initial_capital".to_string(),
            reason: "initial_capital must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_margin_requirement(config: &dyn ConfigPort) -> Result<(), SignaltraderError> {
    let value = config.get_double("backtest", "margin_requirement", 0.0)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(SignaltraderError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "margin_requirement".to_string(),
            reason: "margin_requirement must be between 0 and 1".to_string(),
        });
    }
    Ok(())
}

fn validate_risk_free_rate(config: &dyn ConfigPort) -> Result<(), SignaltraderError> {
    let value = config.get_double("backtest", "risk_free_rate", DEFAULT_RISK_FREE_RATE)?;
    if !(0.0..1.0).contains(&value) {
        return Err(SignaltraderError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "risk_free_rate".to_string(),
            reason: "risk_free_rate must be between 0 and 1".to_string(),
        });
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), SignaltraderError> {
    for key in ["start_date", "end_date"] {
        let value = config
            .get_string("backtest", key)
            .ok_or_else(|| SignaltraderError::ConfigMissing {
                section: "backtest".to_string(),
                key: key.to_string(),
            })?;
        parse_date(&value)?;
    }
    Ok(())
}

fn validate_tickers(config: &dyn ConfigPort) -> Result<(), SignaltraderError> {
    let tickers = config.get_list("backtest", "tickers").unwrap_or_default();
    if tickers.is_empty() {
        return Err(SignaltraderError::ConfigMissing {
            section: "backtest".to_string(),
            key: "tickers".to_string(),
        });
    }

    let mut seen = HashSet::new();
    for ticker in &tickers {
        if !seen.insert(ticker) {
            return Err(SignaltraderError::ConfigInvalid {
                section: "backtest".to_string(),
                key: "tickers".to_string(),
                reason: format!("duplicate ticker {ticker}"),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapConfig(HashMap<(String, String), String>);

    impl MapConfig {
        fn new(pairs: &[(&str, &str, &str)]) -> Self {
            MapConfig(
                pairs
                    .iter()
                    .map(|(s, k, v)| ((s.to_string(), k.to_string()), v.to_string()))
                    .collect(),
            )
        }
    }

    impl ConfigPort for MapConfig {
        fn get_string(&self, section: &str, key: &str) -> Option<String> {
            self.0.get(&(section.to_string(), key.to_string())).cloned()
        }
    }

    fn valid() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("backtest", "start_date", "2024-01-01"),
            ("backtest", "end_date", "2024-03-31"),
            ("backtest", "initial_capital", "100000"),
            ("backtest", "tickers", "AAPL, msft"),
        ]
    }

    fn with(extra: &[(&'static str, &'static str, &'static str)]) -> MapConfig {
        let mut pairs = valid();
        for e in extra {
            pairs.retain(|p| !(p.0 == e.0 && p.1 == e.1));
            pairs.push(*e);
        }
        MapConfig::new(&pairs)
    }

    #[test]
    fn valid_config_passes() {
        assert!(validate_backtest_config(&with(&[])).is_ok());
    }

    #[test]
    fn reversed_dates_are_allowed() {
        let config = with(&[("backtest", "start_date", "2024-06-01")]);
        assert!(validate_backtest_config(&config).is_ok());
    }

    #[test]
    fn bad_date_is_calendar_error() {
        let config = with(&[("backtest", "end_date", "31/03/2024")]);
        assert!(matches!(
            validate_backtest_config(&config),
            Err(SignaltraderError::InvalidDate { .. })
        ));
    }

    #[test]
    fn missing_start_date() {
        let mut pairs = valid();
        pairs.retain(|p| p.1 != "start_date");
        let err = validate_backtest_config(&MapConfig::new(&pairs)).unwrap_err();
        assert!(matches!(err, SignaltraderError::ConfigMissing { key, .. } if key == "start_date"));
    }

    #[test]
    fn non_positive_capital_rejected() {
        let config = with(&[("backtest", "initial_capital", "0")]);
        assert!(matches!(
            validate_backtest_config(&config),
            Err(SignaltraderError::ConfigInvalid { key, .. }) if key == "initial_capital"
        ));
    }

    #[test]
    fn margin_requirement_range() {
        assert!(validate_backtest_config(&with(&[("backtest", "margin_requirement", "0.5")])).is_ok());
        assert!(validate_backtest_config(&with(&[("backtest", "margin_requirement", "1.5")])).is_err());
    }

    #[test]
    fn risk_free_rate_range() {
        assert!(validate_backtest_config(&with(&[("backtest", "risk_free_rate", "1.0")])).is_err());
        assert!(validate_backtest_config(&with(&[("backtest", "risk_free_rate", "-0.1")])).is_err());
    }

    fn rejects_as_not_a_number(key: &'static str, value: &'static str) {
        let err = validate_backtest_config(&with(&[("backtest", key, value)])).unwrap_err();
        assert!(
            matches!(&err, SignaltraderError::ConfigInvalid { key: k, reason, .. }
                if k == key && reason.contains("not a number")),
            "unexpected error for {key}: {err}"
        );
    }

    #[test]
    fn unparseable_initial_capital_is_not_defaulted() {
        rejects_as_not_a_number("initial_capital", "10k");
    }

    #[test]
    fn unparseable_margin_requirement_is_not_defaulted() {
        rejects_as_not_a_number("margin_requirement", "lots");
    }

    #[test]
    fn unparseable_risk_free_rate_is_not_defaulted() {
        rejects_as_not_a_number("risk_free_rate", "2%");
    }

    #[test]
    fn non_finite_capital_rejected() {
        let config = with(&[("backtest", "initial_capital", "NaN")]);
        assert!(validate_backtest_config(&config).is_err());
    }

    #[test]
    fn tickers_required_and_unique() {
        let empty = with(&[("backtest", "tickers", " , ")]);
        assert!(matches!(
            validate_backtest_config(&empty),
            Err(SignaltraderError::ConfigMissing { .. })
        ));

        let dup = with(&[("backtest", "tickers", "AAPL,aapl")]);
        assert!(matches!(
            validate_backtest_config(&dup),
            Err(SignaltraderError::ConfigInvalid { reason, .. }) if reason.contains("AAPL")
        ));
    }

    #[test]
    fn data_section_required_for_replay() {
        assert!(validate_data_config(&with(&[])).is_err());
        let config = with(&[
            ("data", "prices_dir", "/tmp/prices"),
            ("data", "decisions", "/tmp/decisions.jsonl"),
        ]);
        assert!(validate_data_config(&config).is_ok());
    }
}
