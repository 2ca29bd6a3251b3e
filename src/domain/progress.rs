//! Progress events emitted by the orchestrator.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::backtest::DayResult;

/// Event name for per-day progress frames at the transport boundary.
pub const PROGRESS_EVENT: &str = "progress";
/// Event name for the final report frame.
pub const COMPLETE_EVENT: &str = "complete";
/// Event name for a run that failed before producing a report.
pub const ERROR_EVENT: &str = "error";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// Sent before a date is processed. `current_step` is 1-based.
    Progress {
        current_date: NaiveDate,
        current_step: usize,
        total_dates: usize,
    },
    /// Sent once a date has produced a day result.
    BacktestResult { data: DayResult },
}

impl ProgressEvent {
    pub fn event_name(&self) -> &'static str {
        PROGRESS_EVENT
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::decision::DecisionMap;
    use crate::domain::portfolio::Positions;

    #[test]
    fn progress_serializes_with_type_tag() {
        let event = ProgressEvent::Progress {
            current_date: NaiveDate::from_ymd_opt(2024, 1, 8).unwrap(),
            current_step: 1,
            total_dates: 5,
        };
        assert_eq!(
            event.to_json().unwrap(),
            r#"{"type":"progress","current_date":"2024-01-08","current_step":1,"total_dates":5}"#
        );
        assert_eq!(event.event_name(), "progress");
    }

    #[test]
    fn backtest_result_wraps_day_in_data() {
        let day = DayResult {
            date: NaiveDate::from_ymd_opt(2024, 1, 8).unwrap(),
            decisions: DecisionMap::new(),
            analyst_signals: serde_json::Value::Null,
            trades: Vec::new(),
            cash: 1_000.0,
            positions: Positions::new(),
            portfolio_value: 1_000.0,
        };
        let event = ProgressEvent::BacktestResult { data: day.clone() };
        let value: serde_json::Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();

        assert_eq!(value["type"], "backtest_result");
        assert_eq!(value["data"]["date"], "2024-01-08");
        assert_eq!(value["data"]["portfolio_value"], 1_000.0);

        let back: ProgressEvent = serde_json::from_value(value).unwrap();
        assert_eq!(back, event);
    }
}
