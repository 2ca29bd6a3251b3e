//! CSV report adapter implementing ReportPort.
//!
//! One row per simulated day; skipped days do not appear.

use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::domain::backtest::{BacktestReport, DayResult};
use crate::domain::error::SignaltraderError;
use crate::ports::report_port::ReportPort;

#[derive(Debug, Serialize)]
struct DayRow<'a> {
    date: String,
    cash: f64,
    portfolio_value: f64,
    positions: usize,
    trades: usize,
    tickers_held: &'a str,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        CsvReportAdapter
    }
}

fn held(day: &DayResult) -> String {
    day.positions.keys().cloned().collect::<Vec<_>>().join(";")
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, report: &BacktestReport, output_path: &Path) -> Result<(), SignaltraderError> {
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let csv_err = |e: csv::Error| SignaltraderError::Report {
            reason: format!("CSV write error: {}", e),
        };

        let mut writer = csv::Writer::from_path(output_path).map_err(csv_err)?;
        for day in &report.results {
            let tickers = held(day);
            writer
                .serialize(DayRow {
                    date: day.date.to_string(),
                    cash: day.cash,
                    portfolio_value: day.portfolio_value,
                    positions: day.positions.len(),
                    trades: day.trades.len(),
                    tickers_held: &tickers,
                })
                .map_err(csv_err)?;
        }
        writer.flush()?;
        Ok(())
    }
}
