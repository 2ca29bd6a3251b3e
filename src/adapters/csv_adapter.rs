//! CSV file price adapter.
//!
//! Reads one `{TICKER}.csv` per ticker from a directory. Files need a header
//! row with at least `date` and `close` columns; other columns are ignored.

use crate::domain::calendar::parse_date;
use crate::domain::error::SignaltraderError;
use crate::ports::price_port::PricePort;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

pub struct CsvAdapter {
    base_path: PathBuf,
    closes: HashMap<String, BTreeMap<NaiveDate, f64>>,
}

impl CsvAdapter {
    /// Load closing prices for every ticker up front. A missing or malformed
    /// file is an error.
    pub fn load<P: AsRef<Path>>(base_path: P, tickers: &[String]) -> Result<Self, SignaltraderError> {
        let mut adapter = CsvAdapter {
            base_path: base_path.as_ref().to_path_buf(),
            closes: HashMap::new(),
        };
        for ticker in tickers {
            let series = adapter.read_closes(ticker)?;
            adapter.closes.insert(ticker.clone(), series);
        }
        Ok(adapter)
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", ticker))
    }

    pub fn read_closes(&self, ticker: &str) -> Result<BTreeMap<NaiveDate, f64>, SignaltraderError> {
        let path = self.csv_path(ticker);
        let content = fs::read_to_string(&path).map_err(|e| SignaltraderError::PriceData {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr.headers().map_err(|e| SignaltraderError::PriceData {
            reason: format!("CSV header error in {}: {}", path.display(), e),
        })?;
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or_else(|| SignaltraderError::PriceData {
                    reason: format!("missing {} column in {}", name, path.display()),
                })
        };
        let date_col = column("date")?;
        let close_col = column("close")?;

        let mut closes = BTreeMap::new();
        for result in rdr.records() {
            let record = result.map_err(|e| SignaltraderError::PriceData {
                reason: format!("CSV parse error: {}", e),
            })?;

            let date_str = record.get(date_col).unwrap_or_default();
            let date = parse_date(date_str).map_err(|e| SignaltraderError::PriceData {
                reason: format!("{} in {}", e, path.display()),
            })?;

            let close: f64 = record
                .get(close_col)
                .unwrap_or_default()
                .trim()
                .parse()
                .map_err(|e| SignaltraderError::PriceData {
                    reason: format!("invalid close value on {}: {}", date, e),
                })?;

            closes.insert(date, close);
        }

        Ok(closes)
    }

    pub fn tickers(&self) -> impl Iterator<Item = &str> {
        self.closes.keys().map(String::as_str)
    }
}

impl PricePort for CsvAdapter {
    fn close_price(&self, ticker: &str, date: NaiveDate) -> Result<Option<f64>, SignaltraderError> {
        let series = self
            .closes
            .get(ticker)
            .ok_or_else(|| SignaltraderError::PriceData {
                reason: format!("no price series loaded for {}", ticker),
            })?;
        Ok(series.get(&date).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_data() -> TempDir {
        let dir = TempDir::new().unwrap();

        fs::write(
            dir.path().join("AAPL.csv"),
            "date,open,high,low,close,volume\n\
             2024-01-08,180.0,186.0,179.0,185.5,50000\n\
             2024-01-09,185.0,186.0,182.0,185.1,60000\n",
        )
        .unwrap();
        fs::write(dir.path().join("MSFT.csv"), "Date,Close\n2024-01-08,374.7\n").unwrap();
        fs::write(dir.path().join("BAD.csv"), "date,open\n2024-01-08,1.0\n").unwrap();

        dir
    }

    fn tickers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn close_price_by_date() {
        let dir = setup_test_data();
        let adapter = CsvAdapter::load(dir.path(), &tickers(&["AAPL", "MSFT"])).unwrap();

        assert_eq!(adapter.close_price("AAPL", date(8)).unwrap(), Some(185.5));
        assert_eq!(adapter.close_price("AAPL", date(9)).unwrap(), Some(185.1));
        assert_eq!(adapter.close_price("MSFT", date(8)).unwrap(), Some(374.7));
    }

    #[test]
    fn missing_bar_is_none() {
        let dir = setup_test_data();
        let adapter = CsvAdapter::load(dir.path(), &tickers(&["MSFT"])).unwrap();
        assert_eq!(adapter.close_price("MSFT", date(10)).unwrap(), None);
    }

    #[test]
    fn unloaded_ticker_is_error() {
        let dir = setup_test_data();
        let adapter = CsvAdapter::load(dir.path(), &tickers(&["AAPL"])).unwrap();
        assert!(adapter.close_price("MSFT", date(8)).is_err());
        assert_eq!(adapter.tickers().collect::<Vec<_>>(), vec!["AAPL"]);
    }

    #[test]
    fn missing_file_fails_load() {
        let dir = setup_test_data();
        let result = CsvAdapter::load(dir.path(), &tickers(&["XYZ"]));
        assert!(matches!(result, Err(SignaltraderError::PriceData { .. })));
    }

    #[test]
    fn missing_close_column_fails_load() {
        let dir = setup_test_data();
        let err = CsvAdapter::load(dir.path(), &tickers(&["BAD"])).err().unwrap();
        assert!(err.to_string().contains("missing close column"));
    }
}
