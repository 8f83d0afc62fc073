use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::chains::{detect_chains, signal_points};
use super::config::BacktestConfig;
use super::signals::SignalFrame;
use crate::stats::descriptive::{mean, round_to, sample_std};
use crate::types::SignalType;
use crate::{PairsError, PairsResult};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One row of the simulation ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestDay {
    pub date: NaiveDate,
    pub price: f64,
    /// Last row of a down chain
    pub is_entry: bool,
    /// Rows since the latest entry, the entry itself being 1
    pub rank: Option<usize>,
    /// Position held from this row to the next
    pub flag: bool,
    /// ln(p_t / p_{t-1}); zero on the first row
    pub benchmark_log_return: f64,
    /// ln(p_{t+1} / p_t) when flagged; zero on the last row
    pub strategy_log_return: f64,
    pub benchmark_cumulative_pct: f64,
    pub strategy_cumulative_pct: f64,
}

/// Strategy vs buy-and-hold over the held-out window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Buy-and-hold return (%), one decimal
    pub benchmark_cumulative_return_pct: f64,
    /// Strategy return (%), one decimal
    pub strategy_cumulative_return_pct: f64,
    pub entries: usize,
    pub days_in_market: usize,
    pub benchmark_max_drawdown_pct: f64,
    pub strategy_max_drawdown_pct: f64,
    /// Annualised Sharpe of daily log returns; `None` for a flat leg
    pub benchmark_sharpe: Option<f64>,
    pub strategy_sharpe: Option<f64>,
    pub days: Vec<BacktestDay>,
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Rank and holding flag per row given the entry markers.
///
/// An entry row has rank 1 and later rows count up until the next entry.
/// A row is flagged for ranks `2..=days_strategy + 1`, i.e. the
/// `days_strategy` rows after each entry.
pub fn holding_schedule(entries: &[bool], days_strategy: usize) -> Vec<(Option<usize>, bool)> {
    let mut rank: Option<usize> = None;
    entries
        .iter()
        .map(|&is_entry| {
            rank = if is_entry { Some(1) } else { rank.map(|r| r + 1) };
            let flag = rank.map_or(false, |r| (2..=days_strategy + 1).contains(&r));
            (rank, flag)
        })
        .collect()
}

/// Replay the down-chain strategy over a held-out window.
///
/// Chains are re-detected inside `tail` alone, so no chain reaches back
/// into the in-sample period.
pub fn run_backtest(
    tail: &SignalFrame,
    max_gap_days: i64,
    config: &BacktestConfig,
) -> PairsResult<BacktestResult> {
    config.validate()?;
    if tail.is_empty() {
        return Err(PairsError::InsufficientData(
            "backtest window has no observations".into(),
        ));
    }
    let prices = tail.prices_1();
    if let Some(pos) = prices.iter().position(|p| !p.is_finite() || *p <= 0.0) {
        return Err(PairsError::numerical(
            "backtest",
            format!(
                "price on {} must be finite and positive",
                tail.rows[pos].date
            ),
        ));
    }

    // ------------------------------------------------------------------
    // 1. Entry points: terminal rows of down chains
    // ------------------------------------------------------------------
    let chained = detect_chains(&signal_points(&tail.rows), max_gap_days)?;
    let mut entries = vec![false; tail.len()];
    for c in chained
        .iter()
        .filter(|c| c.is_last && c.signal_type == SignalType::Down)
    {
        entries[c.position] = true;
    }

    // ------------------------------------------------------------------
    // 2. Holding schedule
    // ------------------------------------------------------------------
    let schedule = holding_schedule(&entries, config.days_strategy);

    // ------------------------------------------------------------------
    // 3. Daily log returns of both legs
    // ------------------------------------------------------------------
    let n = prices.len();
    let benchmark: Vec<f64> = (0..n)
        .map(|t| if t == 0 { 0.0 } else { (prices[t] / prices[t - 1]).ln() })
        .collect();
    let strategy: Vec<f64> = (0..n)
        .map(|t| {
            if t + 1 < n && schedule[t].1 {
                (prices[t + 1] / prices[t]).ln()
            } else {
                0.0
            }
        })
        .collect();

    // ------------------------------------------------------------------
    // 4. Ledger and cumulative returns
    // ------------------------------------------------------------------
    let (mut bench_sum, mut strat_sum) = (0.0, 0.0);
    let mut days = Vec::with_capacity(n);
    for t in 0..n {
        bench_sum += benchmark[t];
        strat_sum += strategy[t];
        days.push(BacktestDay {
            date: tail.rows[t].date,
            price: prices[t],
            is_entry: entries[t],
            rank: schedule[t].0,
            flag: schedule[t].1,
            benchmark_log_return: benchmark[t],
            strategy_log_return: strategy[t],
            benchmark_cumulative_pct: cumulative_pct(bench_sum),
            strategy_cumulative_pct: cumulative_pct(strat_sum),
        });
    }

    let result = BacktestResult {
        benchmark_cumulative_return_pct: round_to(cumulative_pct(bench_sum), 1),
        strategy_cumulative_return_pct: round_to(cumulative_pct(strat_sum), 1),
        entries: entries.iter().filter(|e| **e).count(),
        days_in_market: schedule.iter().filter(|(_, flag)| *flag).count(),
        benchmark_max_drawdown_pct: compute_max_drawdown(&benchmark) * 100.0,
        strategy_max_drawdown_pct: compute_max_drawdown(&strategy) * 100.0,
        benchmark_sharpe: compute_sharpe(&benchmark[1..]),
        strategy_sharpe: compute_sharpe(&strategy[..n - 1]),
        days,
    };

    info!(
        benchmark_pct = result.benchmark_cumulative_return_pct,
        strategy_pct = result.strategy_cumulative_return_pct,
        entries = result.entries,
        "backtest"
    );
    Ok(result)
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn cumulative_pct(log_sum: f64) -> f64 {
    (log_sum.exp() - 1.0) * 100.0
}

/// Annualised Sharpe ratio (zero risk-free rate) of daily log returns.
fn compute_sharpe(returns: &[f64]) -> Option<f64> {
    let m = mean(returns)?;
    let s = sample_std(returns)?;
    if s == 0.0 {
        return None;
    }
    Some(m / s * TRADING_DAYS_PER_YEAR.sqrt())
}

/// Maximum peak-to-trough decline of the wealth path, as a fraction.
fn compute_max_drawdown(log_returns: &[f64]) -> f64 {
    let mut log_wealth = 0.0_f64;
    let mut peak = 0.0_f64;
    let mut max_dd = 0.0_f64;

    for r in log_returns {
        log_wealth += r;
        if log_wealth > peak {
            peak = log_wealth;
        }
        let dd = 1.0 - (log_wealth - peak).exp();
        if dd > max_dd {
            max_dd = dd;
        }
    }
    max_dd
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
