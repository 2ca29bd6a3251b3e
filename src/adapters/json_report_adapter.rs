//! JSON report adapter implementing ReportPort.
//!
//! Writes the consolidated report as pretty-printed JSON: per-day results,
//! performance metrics, final portfolio and skipped days.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::backtest::BacktestReport;
use crate::domain::error::SignaltraderError;
use crate::ports::report_port::ReportPort;

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonReportAdapter;

impl JsonReportAdapter {
    pub fn new() -> Self {
        JsonReportAdapter
    }
}

impl ReportPort for JsonReportAdapter {
    fn write(&self, report: &BacktestReport, output_path: &Path) -> Result<(), SignaltraderError> {
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(output_path)?);
        serde_json::to_writer_pretty(&mut writer, report).map_err(|e| {
            SignaltraderError::Report {
                reason: format!("failed to serialize report: {}", e),
            }
        })?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}
