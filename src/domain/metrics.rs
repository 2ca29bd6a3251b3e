//! Performance metrics over an equity curve.
//!
//! Every statistic is a pure function of the initial capital and the ordered
//! daily portfolio values. Degenerate inputs (no days, flat curve, zero
//! capital) produce zeros rather than errors or non-finite values.

use serde::{Deserialize, Serialize};

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.02;

/// Volatility at or below this is treated as zero when computing Sharpe.
const ZERO_VOLATILITY: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub initial_capital: f64,
    pub final_value: f64,
    pub total_return: f64,
    pub annualized_return: f64,
    pub max_drawdown: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub trading_days: usize,
}

impl PerformanceReport {
    /// Compute every metric from a stored curve, including a post-pass drawdown.
    pub fn compute(initial_capital: f64, equity_curve: &[f64], risk_free_rate: f64) -> Self {
        Self::with_drawdown(
            initial_capital,
            equity_curve,
            risk_free_rate,
            max_drawdown(equity_curve),
        )
    }

    fn with_drawdown(
        initial_capital: f64,
        equity_curve: &[f64],
        risk_free_rate: f64,
        max_drawdown: f64,
    ) -> Self {
        let final_value = equity_curve.last().copied().unwrap_or(initial_capital);
        let trading_days = equity_curve.len();

        let annualized =
            annualized_return(initial_capital, final_value, trading_days).unwrap_or(0.0);
        let returns = daily_returns(equity_curve);
        let vol = volatility(&returns);

        PerformanceReport {
            initial_capital,
            final_value,
            total_return: total_return(initial_capital, final_value),
            annualized_return: annualized,
            max_drawdown,
            volatility: vol,
            sharpe_ratio: sharpe_ratio(annualized, vol, risk_free_rate),
            trading_days,
        }
    }
}

pub fn total_return(initial_capital: f64, final_value: f64) -> f64 {
    if initial_capital > 0.0 {
        (final_value - initial_capital) / initial_capital
    } else {
        0.0
    }
}

/// Compound annual growth rate over `trading_days` (252 per year).
///
/// `None` when there are no trading days or no initial capital, where the
/// rate is undefined.
pub fn annualized_return(initial_capital: f64, final_value: f64, trading_days: usize) -> Option<f64> {
    if trading_days == 0 || initial_capital <= 0.0 {
        return None;
    }
    let factor = final_value / initial_capital;
    let years = trading_days as f64 / TRADING_DAYS_PER_YEAR;
    let rate = factor.powf(1.0 / years) - 1.0;
    rate.is_finite().then_some(rate)
}

/// Simple day-over-day returns. Empty for fewer than two points.
pub fn daily_returns(equity_curve: &[f64]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .map(|w| {
            let (prev, curr) = (w[0], w[1]);
            if prev > 0.0 { (curr - prev) / prev } else { 0.0 }
        })
        .collect()
}

/// Annualized population standard deviation of daily returns.
pub fn volatility(daily_returns: &[f64]) -> f64 {
    if daily_returns.is_empty() {
        return 0.0;
    }
    let n = daily_returns.len() as f64;
    let mean = daily_returns.iter().sum::<f64>() / n;
    let variance = daily_returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt() * TRADING_DAYS_PER_YEAR.sqrt()
}

/// `(annualized_return - risk_free_rate) / volatility`, or exactly 0 for zero volatility.
pub fn sharpe_ratio(annualized_return: f64, volatility: f64, risk_free_rate: f64) -> f64 {
    if volatility > ZERO_VOLATILITY {
        (annualized_return - risk_free_rate) / volatility
    } else {
        0.0
    }
}

/// Running-peak drawdown tracker, fed one portfolio value at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DrawdownTracker {
    peak: Option<f64>,
    current: f64,
    max: f64,
}

impl DrawdownTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, value: f64) {
        match self.peak {
            Some(peak) if value <= peak => {
                self.current = if peak > 0.0 { (peak - value) / peak } else { 0.0 };
                self.max = self.max.max(self.current);
            }
            _ => {
                self.peak = Some(value);
                self.current = 0.0;
            }
        }
    }

    pub fn current_drawdown(&self) -> f64 {
        self.current
    }

    pub fn max_drawdown(&self) -> f64 {
        self.max
    }
}

/// Post-pass maximum drawdown over a stored curve.
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    let mut tracker = DrawdownTracker::new();
    for &value in equity_curve {
        tracker.observe(value);
    }
    tracker.max_drawdown()
}

/// Equity curve built one day at a time, tracking drawdown as it grows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EquityCurve {
    values: Vec<f64>,
    drawdown: DrawdownTracker,
}

impl EquityCurve {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: f64) {
        self.values.push(value);
        self.drawdown.observe(value);
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn max_drawdown(&self) -> f64 {
        self.drawdown.max_drawdown()
    }

    /// Report using the incrementally tracked drawdown.
    pub fn report(&self, initial_capital: f64, risk_free_rate: f64) -> PerformanceReport {
        PerformanceReport::with_drawdown(
            initial_capital,
            &self.values,
            risk_free_rate,
            self.max_drawdown(),
        )
    }
}
