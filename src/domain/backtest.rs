//! Backtest orchestrator.
//!
//! Drives the trading calendar one date at a time: ask the decision oracle,
//! execute its decisions against the portfolio, record the day. Days are
//! strictly sequential because each oracle call sees the portfolio left by the
//! previous day. A day that fails (oracle error, unparseable decisions) is
//! recorded as skipped and the run continues.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::calendar::trading_days;
use super::decision::DecisionMap;
use super::error::SignaltraderError;
use super::execution::{execute_decisions, Trade};
use super::metrics::{EquityCurve, PerformanceReport, DEFAULT_RISK_FREE_RATE};
use super::portfolio::{Portfolio, Positions, PriceMap};
use super::progress::ProgressEvent;
use crate::ports::decision_port::{DecisionOracle, DecisionRequest};
use crate::ports::progress_port::ProgressSink;

/// Language-model selection passed through to the oracle untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub name: String,
    pub provider: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: f64,
    pub margin_requirement: f64,
    pub risk_free_rate: f64,
    pub tickers: Vec<String>,
    pub model: ModelConfig,
}

impl BacktestConfig {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate, initial_capital: f64) -> Self {
        BacktestConfig {
            start_date,
            end_date,
            initial_capital,
            margin_requirement: 0.0,
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            tickers: Vec::new(),
            model: ModelConfig::default(),
        }
    }
}

/// One successfully simulated date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayResult {
    pub date: NaiveDate,
    pub decisions: DecisionMap,
    #[serde(default)]
    pub analyst_signals: serde_json::Value,
    pub trades: Vec<Trade>,
    pub cash: f64,
    pub positions: Positions,
    /// Cash plus positions marked at this date's prices.
    pub portfolio_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedDay {
    pub date: NaiveDate,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DayOutcome {
    Completed(DayResult),
    Skipped(SkippedDay),
}

impl DayOutcome {
    pub fn date(&self) -> NaiveDate {
        match self {
            DayOutcome::Completed(day) => day.date,
            DayOutcome::Skipped(skip) => skip.date,
        }
    }

    pub fn day_result(&self) -> Option<&DayResult> {
        match self {
            DayOutcome::Completed(day) => Some(day),
            DayOutcome::Skipped(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BacktestState {
    NotStarted,
    Running,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalPortfolio {
    pub cash: f64,
    pub positions: Positions,
    pub value: f64,
    pub margin_requirement: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    pub results: Vec<DayResult>,
    pub performance_metrics: PerformanceReport,
    pub final_portfolio: FinalPortfolio,
    #[serde(default)]
    pub skipped_days: Vec<SkippedDay>,
}

struct DayStep {
    result: DayResult,
    portfolio: Portfolio,
    prices: PriceMap,
}

/// A single backtest run, advanced one date per [`Backtest::step`].
///
/// The caller owns the loop, so stopping early is just not calling `step`
/// again; [`Backtest::finish`] reports on whatever has run.
#[derive(Debug)]
pub struct Backtest {
    config: BacktestConfig,
    dates: Vec<NaiveDate>,
    cursor: usize,
    portfolio: Portfolio,
    last_prices: PriceMap,
    outcomes: Vec<DayOutcome>,
    equity: EquityCurve,
    state: BacktestState,
}

impl Backtest {
    pub fn new(config: BacktestConfig) -> Self {
        let dates = trading_days(config.start_date, config.end_date);
        let portfolio = Portfolio::new(config.initial_capital, config.margin_requirement);
        Backtest {
            config,
            dates,
            cursor: 0,
            portfolio,
            last_prices: PriceMap::new(),
            outcomes: Vec::new(),
            equity: EquityCurve::new(),
            state: BacktestState::NotStarted,
        }
    }

    pub fn state(&self) -> BacktestState {
        self.state
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn outcomes(&self) -> &[DayOutcome] {
        &self.outcomes
    }

    pub fn equity_curve(&self) -> &EquityCurve {
        &self.equity
    }

    /// Simulate the next date. Returns `None` once every date has been processed.
    pub async fn step<O, S>(&mut self, oracle: &O, progress: &S) -> Option<&DayOutcome>
    where
        O: DecisionOracle,
        S: ProgressSink,
    {
        let Some(&date) = self.dates.get(self.cursor) else {
            self.state = BacktestState::Completed;
            return None;
        };
        self.state = BacktestState::Running;

        progress.send(ProgressEvent::Progress {
            current_date: date,
            current_step: self.cursor + 1,
            total_dates: self.dates.len(),
        });

        let day = self.simulate_day(date, oracle).await;
        let outcome = match day {
            Ok(step) => {
                self.portfolio = step.portfolio;
                self.last_prices = step.prices;
                self.equity.push(step.result.portfolio_value);
                progress.send(ProgressEvent::BacktestResult {
                    data: step.result.clone(),
                });
                DayOutcome::Completed(step.result)
            }
            Err(e) => {
                warn!(%date, error = %e, "skipping day");
                DayOutcome::Skipped(SkippedDay {
                    date,
                    reason: e.to_string(),
                })
            }
        };

        self.cursor += 1;
        if self.cursor == self.dates.len() {
            self.state = BacktestState::Completed;
        }
        self.outcomes.push(outcome);
        self.outcomes.last()
    }

    async fn simulate_day<O: DecisionOracle>(
        &self,
        date: NaiveDate,
        oracle: &O,
    ) -> Result<DayStep, SignaltraderError> {
        let response = oracle
            .decide(DecisionRequest {
                date,
                portfolio: &self.portfolio,
                tickers: &self.config.tickers,
                model: &self.config.model,
            })
            .await?;

        let decisions = response.decisions()?;
        let prices = response.data.current_prices;
        let execution = execute_decisions(&self.portfolio, &decisions, &prices);
        let portfolio_value = execution.portfolio.total_value(&prices);

        let result = DayResult {
            date,
            decisions,
            analyst_signals: response.data.analyst_signals,
            trades: execution.trades,
            cash: execution.portfolio.cash,
            positions: execution.portfolio.positions.clone(),
            portfolio_value,
        };

        Ok(DayStep {
            result,
            portfolio: execution.portfolio,
            prices,
        })
    }

    /// Fold the recorded days into the consolidated report.
    pub fn finish(self) -> BacktestReport {
        let performance_metrics = self
            .equity
            .report(self.config.initial_capital, self.config.risk_free_rate);

        let mut results = Vec::new();
        let mut skipped_days = Vec::new();
        for outcome in self.outcomes {
            match outcome {
                DayOutcome::Completed(day) => results.push(day),
                DayOutcome::Skipped(skip) => skipped_days.push(skip),
            }
        }

        let final_portfolio = FinalPortfolio {
            cash: self.portfolio.cash,
            value: self.portfolio.total_value(&self.last_prices),
            positions: self.portfolio.positions,
            margin_requirement: self.portfolio.margin_requirement,
        };

        BacktestReport {
            results,
            performance_metrics,
            final_portfolio,
            skipped_days,
        }
    }
}

/// Run every date in the configured window and return the report.
pub async fn run_backtest<O, S>(config: BacktestConfig, oracle: &O, progress: &S) -> BacktestReport
where
    O: DecisionOracle,
    S: ProgressSink,
{
    let mut backtest = Backtest::new(config);
    info!(
        start = %backtest.config.start_date,
        end = %backtest.config.end_date,
        dates = backtest.dates.len(),
        tickers = backtest.config.tickers.len(),
        "starting backtest"
    );

    while backtest.step(oracle, progress).await.is_some() {}

    let report = backtest.finish();
    info!(
        days = report.results.len(),
        skipped = report.skipped_days.len(),
        final_value = report.performance_metrics.final_value,
        "backtest complete"
    );
    report
}
