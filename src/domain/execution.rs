//! Trade execution simulator.
//!
//! Converts one day's decision map into share transactions against the
//! portfolio. Fills happen at the day's price in full; there is no slippage,
//! commission, or partial fill.
//!
//! Buy policy: the target dollar allocation for a ticker is
//! `total_value * allocation_percentage / 100`. If that exceeds the current
//! holding's value, the difference is invested in whole shares, provided the
//! un-floored difference fits in available cash. Sells always liquidate the
//! whole position.

use serde::{Deserialize, Serialize};

use super::decision::{DecisionMap, Recommendation};
use super::portfolio::{Portfolio, Position, PriceMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Buy,
    Sell,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub ticker: String,
    pub action: TradeAction,
    pub shares: u64,
    pub price: f64,
    /// Always `shares * price`.
    pub total: f64,
}

impl Trade {
    fn new(ticker: &str, action: TradeAction, shares: u64, price: f64) -> Self {
        Trade {
            ticker: ticker.to_string(),
            action,
            shares,
            price,
            total: shares as f64 * price,
        }
    }
}

/// Outcome of simulating one day's decisions.
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    pub portfolio: Portfolio,
    pub trades: Vec<Trade>,
}

/// Apply `decisions` at `prices` to a copy of `portfolio`.
///
/// Tickers are processed in decision-map order and each sees the cash and
/// positions left by the previous one. Tickers without a positive price are
/// skipped.
pub fn execute_decisions(
    portfolio: &Portfolio,
    decisions: &DecisionMap,
    prices: &PriceMap,
) -> Execution {
    let mut next = portfolio.clone();
    let mut trades = Vec::new();

    for (ticker, decision) in decisions.iter() {
        let price = match prices.get(ticker) {
            Some(&p) if p > 0.0 => p,
            _ => {
                tracing::debug!(ticker, "no usable price, skipping");
                continue;
            }
        };

        let trade = match decision.recommendation {
            Recommendation::Hold => None,
            Recommendation::Buy => buy(
                &mut next,
                ticker,
                price,
                decision.allocation_percentage,
                prices,
            ),
            Recommendation::Sell => sell(&mut next, ticker, price),
        };

        if let Some(trade) = trade {
            tracing::debug!(
                ticker,
                action = ?trade.action,
                shares = trade.shares,
                price = trade.price,
                "executed trade"
            );
            trades.push(trade);
        }
    }

    Execution {
        portfolio: next,
        trades,
    }
}

/// Number of whole shares to buy so `ticker` reaches its target allocation,
/// or `None` when the buy is not executed.
pub fn shares_to_buy(
    portfolio: &Portfolio,
    ticker: &str,
    price: f64,
    allocation_percentage: f64,
    prices: &PriceMap,
) -> Option<u64> {
    let total = portfolio.total_value(prices);
    let target = total * allocation_percentage / 100.0;
    let current = portfolio.shares(ticker) as f64 * price;

    if target <= current {
        return None;
    }

    let incremental = target - current;
    let shares = (incremental / price).floor() as u64;

    // Gate on the un-floored amount; the floored cost can only be smaller.
    if shares > 0 && incremental <= portfolio.cash {
        Some(shares)
    } else {
        None
    }
}

fn buy(
    portfolio: &mut Portfolio,
    ticker: &str,
    price: f64,
    allocation_percentage: f64,
    prices: &PriceMap,
) -> Option<Trade> {
    let shares = shares_to_buy(portfolio, ticker, price, allocation_percentage, prices)?;
    let cost = shares as f64 * price;
    debug_assert!(cost <= portfolio.cash, "floored buy cost exceeds cash");

    portfolio.cash -= cost;

    let position = portfolio
        .positions
        .entry(ticker.to_string())
        .or_insert(Position {
            shares: 0,
            cost_basis: 0.0,
        });
    let old_cost = position.cost_basis * position.shares as f64;
    position.shares += shares;
    position.cost_basis = (old_cost + cost) / position.shares as f64;

    Some(Trade::new(ticker, TradeAction::Buy, shares, price))
}

fn sell(portfolio: &mut Portfolio, ticker: &str, price: f64) -> Option<Trade> {
    let position = portfolio.positions.remove(ticker)?;
    if position.shares == 0 {
        return None;
    }

    let trade = Trade::new(ticker, TradeAction::Sell, position.shares, price);
    portfolio.cash += trade.total;
    Some(trade)
}
