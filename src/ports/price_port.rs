//! Historical price lookup port.

use crate::domain::error::SignaltraderError;
use chrono::NaiveDate;

pub trait PricePort {
    /// Closing price of `ticker` on `date`, `None` when there was no bar that day.
    fn close_price(&self, ticker: &str, date: NaiveDate) -> Result<Option<f64>, SignaltraderError>;
}
