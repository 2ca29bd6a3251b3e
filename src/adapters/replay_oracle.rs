//! Decision oracle that replays recorded responses.
//!
//! Each line of the decisions file is one JSON object:
//!
//! ```text
//! {"date": "2024-01-08", "messages": [{"content": "{\"AAPL\": {...}}"}], "data": {...}}
//! ```
//!
//! `messages` and `data` have the same shape as a live oracle response. Any
//! requested ticker missing from `data.current_prices` is priced from the
//! [`PricePort`] at that date's close. A date with no recorded line fails,
//! which the orchestrator treats as a skipped day.

use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::domain::error::SignaltraderError;
use crate::ports::decision_port::{
    DecisionOracle, DecisionRequest, OracleData, OracleMessage, OracleResponse,
};
use crate::ports::price_port::PricePort;

#[derive(Debug, Deserialize)]
struct RecordedResponse {
    date: NaiveDate,
    #[serde(default)]
    messages: Vec<OracleMessage>,
    #[serde(default)]
    data: OracleData,
}

pub struct ReplayOracle<P> {
    records: HashMap<NaiveDate, OracleResponse>,
    prices: P,
}

impl<P: PricePort> ReplayOracle<P> {
    pub fn from_file<Q: AsRef<Path>>(path: Q, prices: P) -> Result<Self, SignaltraderError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| SignaltraderError::ConfigInvalid {
            section: "data".into(),
            key: "decisions".into(),
            reason: format!("failed to open {}: {}", path.display(), e),
        })?;
        Self::from_reader(BufReader::new(file), prices)
    }

    /// Read JSON lines; blank lines are ignored, a later line for the same
    /// date replaces an earlier one.
    pub fn from_reader<R: BufRead>(reader: R, prices: P) -> Result<Self, SignaltraderError> {
        let mut records = HashMap::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let recorded: RecordedResponse =
                serde_json::from_str(&line).map_err(|e| SignaltraderError::ConfigInvalid {
                    section: "data".into(),
                    key: "decisions".into(),
                    reason: format!("line {}: {}", index + 1, e),
                })?;
            records.insert(
                recorded.date,
                OracleResponse {
                    messages: recorded.messages,
                    data: recorded.data,
                },
            );
        }
        tracing::debug!(records = records.len(), "loaded recorded decisions");
        Ok(ReplayOracle { records, prices })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<P: PricePort> DecisionOracle for ReplayOracle<P> {
    async fn decide(&self, request: DecisionRequest<'_>) -> Result<OracleResponse, SignaltraderError> {
        let mut response = self.records.get(&request.date).cloned().ok_or_else(|| {
            SignaltraderError::Oracle {
                date: request.date.to_string(),
                reason: "no recorded decision".into(),
            }
        })?;

        for ticker in request.tickers {
            if response.data.current_prices.contains_key(ticker) {
                continue;
            }
            if let Some(close) = self.prices.close_price(ticker, request.date)? {
                response.data.current_prices.insert(ticker.clone(), close);
            }
        }
        Ok(response)
    }
}
