//! Trading calendar: weekdays between two inclusive bounds.
//!
//! No holiday calendar is consulted; only Saturdays and Sundays are dropped.

use chrono::{Datelike, NaiveDate, Weekday};

use super::error::SignaltraderError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` date string.
pub fn parse_date(value: &str) -> Result<NaiveDate, SignaltraderError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        SignaltraderError::InvalidDate {
            value: value.to_string(),
        }
    })
}

pub fn is_trading_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Ordered business days in `[start, end]`. Empty when `start > end`.
pub fn trading_days(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| is_trading_day(*d))
        .collect()
}

/// Like [`trading_days`] but from date strings; bad input is a fatal calendar error.
pub fn trading_days_between(start: &str, end: &str) -> Result<Vec<NaiveDate>, SignaltraderError> {
    let start = parse_date(start)?;
    let end = parse_date(end)?;
    Ok(trading_days(start, end))
}
