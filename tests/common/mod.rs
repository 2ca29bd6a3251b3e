#![allow(dead_code)]

use chrono::NaiveDate;
use signaltrader::domain::error::SignaltraderError;
use signaltrader::ports::decision_port::{
    DecisionOracle, DecisionRequest, OracleData, OracleMessage, OracleResponse,
};
use std::cell::RefCell;
use std::collections::HashMap;

/// Oracle scripted per date. Unscripted dates fail like a dead upstream.
pub struct MockOracle {
    pub responses: HashMap<NaiveDate, OracleResponse>,
    pub errors: HashMap<NaiveDate, String>,
    /// `(date, cash seen)` for every call, in order.
    pub calls: RefCell<Vec<(NaiveDate, f64)>>,
}

impl MockOracle {
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
            errors: HashMap::new(),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn with_response(mut self, date: &str, content: &str, prices: &[(&str, f64)]) -> Self {
        self.responses.insert(d(date), response(content, prices));
        self
    }

    pub fn with_error(mut self, date: &str, reason: &str) -> Self {
        self.errors.insert(d(date), reason.to_string());
        self
    }

    pub fn call_dates(&self) -> Vec<NaiveDate> {
        self.calls.borrow().iter().map(|(date, _)| *date).collect()
    }
}

impl DecisionOracle for MockOracle {
    async fn decide(&self, request: DecisionRequest<'_>) -> Result<OracleResponse, SignaltraderError> {
        self.calls
            .borrow_mut()
            .push((request.date, request.portfolio.cash));
        if let Some(reason) = self.errors.get(&request.date) {
            return Err(SignaltraderError::Oracle {
                date: request.date.to_string(),
                reason: reason.clone(),
            });
        }
        self.responses
            .get(&request.date)
            .cloned()
            .ok_or_else(|| SignaltraderError::Oracle {
                date: request.date.to_string(),
                reason: "not scripted".into(),
            })
    }
}

pub fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn response(content: &str, prices: &[(&str, f64)]) -> OracleResponse {
    OracleResponse {
        messages: vec![OracleMessage::new(content)],
        data: OracleData {
            current_prices: prices.iter().map(|(t, p)| (t.to_string(), *p)).collect(),
            analyst_signals: serde_json::Value::Null,
        },
    }
}

pub fn buy(ticker: &str, pct: f64) -> String {
    format!(r#"{{"{ticker}": {{"recommendation": "buy", "allocation_percentage": {pct}}}}}"#)
}

pub fn sell(ticker: &str) -> String {
    format!(r#"{{"{ticker}": {{"recommendation": "sell"}}}}"#)
}

pub fn hold(ticker: &str) -> String {
    format!(r#"{{"{ticker}": {{"recommendation": "hold"}}}}"#)
}
