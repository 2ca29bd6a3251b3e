//! Per-ticker trade decisions as produced by the decision oracle.
//!
//! Decision content arrives as a JSON object keyed by ticker. Key order is
//! significant: trades are executed in the order the oracle listed them, so
//! [`DecisionMap`] keeps entries in a `Vec` rather than a hashed map.

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::error::SignaltraderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Recommendation {
    Buy,
    Sell,
    Hold,
}

impl FromStr for Recommendation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "buy" => Ok(Recommendation::Buy),
            "sell" => Ok(Recommendation::Sell),
            "hold" => Ok(Recommendation::Hold),
            other => Err(format!("unknown recommendation '{other}'")),
        }
    }
}

impl TryFrom<String> for Recommendation {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Recommendation::Buy => "buy",
            Recommendation::Sell => "sell",
            Recommendation::Hold => "hold",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerDecision {
    pub recommendation: Recommendation,
    /// Target share of total portfolio value, 0..=100. Missing or null is 0.
    #[serde(default, deserialize_with = "null_as_zero")]
    pub allocation_percentage: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

fn null_as_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

impl TickerDecision {
    pub fn new(recommendation: Recommendation, allocation_percentage: f64) -> Self {
        TickerDecision {
            recommendation,
            allocation_percentage,
            signal: None,
            confidence: None,
        }
    }
}

/// Ticker -> decision, in oracle key order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecisionMap {
    entries: Vec<(String, TickerDecision)>,
}

impl DecisionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; a replaced entry keeps its original position.
    pub fn insert(&mut self, ticker: impl Into<String>, decision: TickerDecision) {
        let ticker = ticker.into();
        match self.entries.iter_mut().find(|(t, _)| *t == ticker) {
            Some((_, existing)) => *existing = decision,
            None => self.entries.push((ticker, decision)),
        }
    }

    pub fn get(&self, ticker: &str) -> Option<&TickerDecision> {
        self.entries
            .iter()
            .find(|(t, _)| t == ticker)
            .map(|(_, d)| d)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TickerDecision)> {
        self.entries.iter().map(|(t, d)| (t.as_str(), d))
    }

    pub fn tickers(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(t, _)| t.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, TickerDecision)> for DecisionMap {
    fn from_iter<I: IntoIterator<Item = (K, TickerDecision)>>(iter: I) -> Self {
        let mut map = DecisionMap::new();
        for (ticker, decision) in iter {
            map.insert(ticker, decision);
        }
        map
    }
}

impl Serialize for DecisionMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|(t, d)| (t, d)))
    }
}

impl<'de> Deserialize<'de> for DecisionMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DecisionMapVisitor;

        impl<'de> Visitor<'de> for DecisionMapVisitor {
            type Value = DecisionMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping tickers to decisions")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut map = DecisionMap::new();
                while let Some((ticker, decision)) =
                    access.next_entry::<String, TickerDecision>()?
                {
                    map.insert(ticker, decision);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(DecisionMapVisitor)
    }
}

/// Parse message content into a decision map.
///
/// Accepts bare JSON or JSON wrapped in a Markdown code fence. Allocation
/// percentages are clamped to `[0, 100]`.
pub fn parse_decisions(content: &str) -> Result<DecisionMap, SignaltraderError> {
    let body = strip_code_fence(content);
    if body.is_empty() {
        return Err(SignaltraderError::DecisionParse {
            reason: "empty decision content".into(),
        });
    }

    let mut map: DecisionMap =
        serde_json::from_str(body).map_err(|e| SignaltraderError::DecisionParse {
            reason: e.to_string(),
        })?;

    for (_, decision) in map.entries.iter_mut() {
        decision.allocation_percentage = decision.allocation_percentage.clamp(0.0, 100.0);
    }
    Ok(map)
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}
