//! Decision oracle port.
//!
//! The oracle is the opaque component that looks at a date and a portfolio
//! snapshot and answers with messages (the last of which carries the decision
//! JSON) plus the prices it saw.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::backtest::ModelConfig;
use crate::domain::decision::{parse_decisions, DecisionMap};
use crate::domain::error::SignaltraderError;
use crate::domain::portfolio::{Portfolio, PriceMap};

/// Everything the oracle is told about one simulated day.
#[derive(Debug, Clone, Copy)]
pub struct DecisionRequest<'a> {
    pub date: NaiveDate,
    pub portfolio: &'a Portfolio,
    pub tickers: &'a [String],
    pub model: &'a ModelConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub content: String,
}

impl OracleMessage {
    pub fn new(content: impl Into<String>) -> Self {
        OracleMessage {
            role: None,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OracleData {
    #[serde(default)]
    pub current_prices: PriceMap,
    #[serde(default)]
    pub analyst_signals: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OracleResponse {
    #[serde(default)]
    pub messages: Vec<OracleMessage>,
    #[serde(default)]
    pub data: OracleData,
}

impl OracleResponse {
    pub fn last_content(&self) -> Option<&str> {
        self.messages.last().map(|m| m.content.as_str())
    }

    /// Parse the decision map out of the last message.
    pub fn decisions(&self) -> Result<DecisionMap, SignaltraderError> {
        let content = self
            .last_content()
            .ok_or_else(|| SignaltraderError::DecisionParse {
                reason: "oracle returned no messages".into(),
            })?;
        parse_decisions(content)
    }
}

#[allow(async_fn_in_trait)]
pub trait DecisionOracle {
    async fn decide(&self, request: DecisionRequest<'_>) -> Result<OracleResponse, SignaltraderError>;
}
