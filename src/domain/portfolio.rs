//! Portfolio state and valuation.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Ticker -> market price for one date.
pub type PriceMap = HashMap<String, f64>;

/// Ticker -> held position. A ticker with zero shares is never present.
pub type Positions = BTreeMap<String, Position>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub shares: u64,
    /// Weighted-average purchase price.
    pub cost_basis: f64,
}

impl Position {
    pub fn market_value(&self, price: f64) -> f64 {
        self.shares as f64 * price
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    pub cash: f64,
    pub positions: Positions,
    /// Carried through unchanged; not enforced by the simulator.
    pub margin_requirement: f64,
}

impl Portfolio {
    pub fn new(initial_capital: f64, margin_requirement: f64) -> Self {
        Portfolio {
            cash: initial_capital,
            positions: BTreeMap::new(),
            margin_requirement,
        }
    }

    pub fn get_position(&self, ticker: &str) -> Option<&Position> {
        self.positions.get(ticker)
    }

    pub fn shares(&self, ticker: &str) -> u64 {
        self.positions.get(ticker).map_or(0, |p| p.shares)
    }

    pub fn positions_value(&self, prices: &PriceMap) -> f64 {
        positions_value(&self.positions, prices)
    }

    pub fn total_value(&self, prices: &PriceMap) -> f64 {
        total_value(self.cash, &self.positions, prices)
    }
}

/// Sum of `shares * price` over held positions. Tickers without a price count as zero.
pub fn positions_value(positions: &Positions, prices: &PriceMap) -> f64 {
    positions
        .iter()
        .filter_map(|(ticker, pos)| prices.get(ticker).map(|&price| pos.market_value(price)))
        .sum()
}

pub fn total_value(cash: f64, positions: &Positions, prices: &PriceMap) -> f64 {
    cash + positions_value(positions, prices)
}
