use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::chains::{detect_chains, signal_points, summarize_chains, ChainedSignal};
use super::config::ValidationConfig;
use super::signals::SignalFrame;
use crate::stats::descriptive::{mean, median};
use crate::stats::hypothesis::two_sample_t_test;
use crate::types::SignalType;
use crate::{PairsError, PairsResult};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Up vs down comparison of forward returns at one horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorizonEvaluation {
    pub horizon: usize,
    /// Two-sided p-value; `None` when the test is undefined
    pub p_value: Option<f64>,
    pub t_statistic: Option<f64>,
    /// Median forward return (%) after terminal up signals
    pub median_up: Option<f64>,
    /// Median forward return (%) after terminal down signals
    pub median_down: Option<f64>,
    pub n_up: usize,
    pub n_down: usize,
    /// Up signals were followed by a negative median return
    pub up_reverts: bool,
    /// Down signals were followed by a positive median return
    pub down_reverts: bool,
}

/// Shape of the detected chains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainStatistics {
    pub chain_count: usize,
    pub median_chain_length: Option<f64>,
    /// Median calendar days between consecutive chain-terminal signals
    pub median_terminal_spacing_days: Option<f64>,
}

/// Outcome of the signal quality check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Mean p-value across horizons is below the significance threshold
    pub accept: bool,
    /// Median of the per-horizon down medians, only when accepted
    pub representative_return: Option<f64>,
    pub mean_p_value: Option<f64>,
    pub significance_threshold: f64,
    /// Every horizon shows reversion in both directions. Not used by `accept`.
    pub all_directions_hold: bool,
    /// Distinct chains holding at least one up signal
    pub chains_up: usize,
    /// Distinct chains holding at least one down signal
    pub chains_down: usize,
    pub horizons: Vec<HorizonEvaluation>,
    pub chain_statistics: ChainStatistics,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Forward percentage return `(p[i+h] / p[i] - 1) * 100`, `None` where the
/// horizon runs past the end of the series.
pub fn forward_returns(prices: &[f64], horizon: usize) -> PairsResult<Vec<Option<f64>>> {
    if let Some(pos) = prices.iter().position(|p| !p.is_finite() || *p <= 0.0) {
        return Err(PairsError::numerical(
            "forward returns",
            format!("price at position {} must be finite and positive", pos),
        ));
    }
    Ok((0..prices.len())
        .map(|i| {
            prices
                .get(i + horizon)
                .map(|ahead| (ahead / prices[i] - 1.0) * 100.0)
        })
        .collect())
}

/// Test whether chain-terminal up and down signals are followed by
/// different forward returns.
///
/// `frame` is the in-sample window; chains are detected inside it.
pub fn evaluate_signals(
    frame: &SignalFrame,
    max_gap_days: i64,
    config: &ValidationConfig,
) -> PairsResult<ValidationResult> {
    config.validate()?;
    if frame.is_empty() {
        return Err(PairsError::InsufficientData(
            "signal validation needs at least one observation".into(),
        ));
    }

    // ------------------------------------------------------------------
    // 1. Chains and their terminal rows
    // ------------------------------------------------------------------
    let chained = detect_chains(&signal_points(&frame.rows), max_gap_days)?;
    let terminals: Vec<&ChainedSignal> = chained.iter().filter(|c| c.is_last).collect();

    // ------------------------------------------------------------------
    // 2. Per-horizon comparison of forward returns
    // ------------------------------------------------------------------
    let prices = frame.prices_1();
    let mut horizons = Vec::with_capacity(config.horizons.len());
    for &h in &config.horizons {
        let fwd = forward_returns(&prices, h)?;
        let (mut up, mut down) = (Vec::new(), Vec::new());
        for t in &terminals {
            if let Some(r) = fwd[t.position] {
                match t.signal_type {
                    SignalType::Up => up.push(r),
                    SignalType::Down => down.push(r),
                }
            }
        }

        let test = two_sample_t_test(&up, &down, config.test_kind)?;
        let median_up = median(&up);
        let median_down = median(&down);
        horizons.push(HorizonEvaluation {
            horizon: h,
            p_value: test.map(|t| t.p_value),
            t_statistic: test.map(|t| t.statistic),
            median_up,
            median_down,
            n_up: up.len(),
            n_down: down.len(),
            up_reverts: median_up.map_or(false, |m| m < 0.0),
            down_reverts: median_down.map_or(false, |m| m > 0.0),
        });
    }

    // ------------------------------------------------------------------
    // 3. Decision
    // ------------------------------------------------------------------
    let p_values: Option<Vec<f64>> = horizons.iter().map(|e| e.p_value).collect();
    let mean_p_value = p_values.and_then(|p| mean(&p));
    let accept = mean_p_value.map_or(false, |p| p < config.significance_threshold);
    let representative_return = if accept {
        let down_medians: Vec<f64> = horizons.iter().filter_map(|e| e.median_down).collect();
        median(&down_medians)
    } else {
        None
    };
    let all_directions_hold = horizons.iter().all(|e| e.up_reverts && e.down_reverts);

    // ------------------------------------------------------------------
    // 4. Chain diagnostics
    // ------------------------------------------------------------------
    let chains_of = |kind: SignalType| {
        chained
            .iter()
            .filter(|c| c.signal_type == kind)
            .map(|c| c.chain_id)
            .collect::<BTreeSet<_>>()
            .len()
    };
    let chains_up = chains_of(SignalType::Up);
    let chains_down = chains_of(SignalType::Down);
    let chain_statistics = chain_statistics(&chained, &terminals);

    info!(
        accept,
        mean_p_value = mean_p_value.unwrap_or(f64::NAN),
        terminals = terminals.len(),
        "signal validation"
    );

    Ok(ValidationResult {
        accept,
        representative_return,
        mean_p_value,
        significance_threshold: config.significance_threshold,
        all_directions_hold,
        chains_up,
        chains_down,
        horizons,
        chain_statistics,
    })
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn chain_statistics(chained: &[ChainedSignal], terminals: &[&ChainedSignal]) -> ChainStatistics {
    let summaries = summarize_chains(chained);
    let lengths: Vec<f64> = summaries.iter().map(|s| s.length as f64).collect();
    let spacing: Vec<f64> = terminals
        .windows(2)
        .map(|w| (w[1].date - w[0].date).num_days() as f64)
        .collect();
    ChainStatistics {
        chain_count: summaries.len(),
        median_chain_length: median(&lengths),
        median_terminal_spacing_days: median(&spacing),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pairs::signals::SignalRow;
    use crate::stats::hypothesis::TTestKind;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 6, 1).unwrap() + chrono::Duration::days(offset)
    }

    /// Frame with one row per day; `signals` maps positions to a type.
    fn frame(prices: &[f64], signals: &[(usize, SignalType)]) -> SignalFrame {
        let rows = prices
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let kind = signals.iter().find(|(pos, _)| *pos == i).map(|(_, k)| *k);
                SignalRow {
                    date: day(i as i64),
                    price_1: *p,
                    price_2: *p,
                    spread: 0.0,
                    z_score: Some(0.0),
                    up_signal: kind == Some(SignalType::Up),
                    low_signal: kind == Some(SignalType::Down),
                }
            })
            .collect();
        SignalFrame {
            asset_1: "A".into(),
            asset_2: "B".into(),
            hedge_ratio: 1.0,
            zscore_adf_p_value: None,
            rows,
        }
    }

    fn one_horizon() -> ValidationConfig {
        ValidationConfig {
            horizons: vec![1],
            significance_threshold: 0.05,
            test_kind: TTestKind::Student,
        }
    }

    #[test]
    fn test_forward_returns() {
        let r = forward_returns(&[100.0, 110.0, 99.0], 1).unwrap();
        assert!((r[0].unwrap() - 10.0).abs() < 1e-12);
        assert!((r[1].unwrap() - -10.0).abs() < 1e-12);
        assert_eq!(r[2], None);
        assert_eq!(forward_returns(&[1.0, 2.0], 5).unwrap(), vec![None, None]);
    }

    #[test]
    fn test_forward_returns_rejects_zero_price() {
        assert!(matches!(
            forward_returns(&[1.0, 0.0], 1),
            Err(PairsError::NumericalError { .. })
        ));
    }

    /// Isolated signals every 10 days. Up signals are followed by drops of
    /// about 5%, down signals by rises of about 5%.
    fn separated_frame() -> SignalFrame {
        let mut prices = vec![100.0; 60];
        let mut signals = Vec::new();
        let moves = [5.0, 4.0, 6.0];
        for (k, m) in moves.iter().enumerate() {
            let up_at = 10 * k;
            prices[up_at + 1] = 100.0 - m;
            signals.push((up_at, SignalType::Up));
            let down_at = 10 * k + 30;
            prices[down_at + 1] = 100.0 + m;
            signals.push((down_at, SignalType::Down));
        }
        frame(&prices, &signals)
    }

    #[test]
    fn test_separated_groups_accepted() {
        let result = evaluate_signals(&separated_frame(), 3, &one_horizon()).unwrap();
        let h = &result.horizons[0];
        assert_eq!((h.n_up, h.n_down), (3, 3));
        assert!((h.median_up.unwrap() - -5.0).abs() < 1e-9);
        assert!((h.median_down.unwrap() - 5.0).abs() < 1e-9);
        assert!(result.accept);
        assert!(result.all_directions_hold);
        assert!((result.representative_return.unwrap() - 5.0).abs() < 1e-9);
        assert_eq!((result.chains_up, result.chains_down), (3, 3));
        assert_eq!(result.chain_statistics.chain_count, 6);
        assert_eq!(result.chain_statistics.median_chain_length, Some(1.0));
        assert_eq!(result.chain_statistics.median_terminal_spacing_days, Some(10.0));
    }

    #[test]
    fn test_rejection_hides_representative_return() {
        // Both groups see the same +1% / -1% responses, so t = 0
        let mut prices = vec![100.0; 40];
        prices[1] = 101.0;
        prices[11] = 99.0;
        prices[21] = 101.0;
        prices[31] = 99.0;
        let signals = vec![
            (0, SignalType::Up),
            (10, SignalType::Up),
            (20, SignalType::Down),
            (30, SignalType::Down),
        ];
        let result = evaluate_signals(&frame(&prices, &signals), 3, &one_horizon()).unwrap();
        assert!(!result.accept);
        assert_eq!(result.representative_return, None);
        assert!((result.mean_p_value.unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_undefined_p_value_rejects() {
        // A single up terminal leaves the t-test undefined
        let prices = vec![100.0; 30];
        let signals = vec![(0, SignalType::Up), (10, SignalType::Down), (20, SignalType::Down)];
        let result = evaluate_signals(&frame(&prices, &signals), 3, &one_horizon()).unwrap();
        assert_eq!(result.horizons[0].p_value, None);
        assert_eq!(result.mean_p_value, None);
        assert!(!result.accept);
    }

    #[test]
    fn test_only_terminal_rows_counted() {
        let prices: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        // One three-day up chain: only its last row is measured
        let signals = vec![(0, SignalType::Up), (1, SignalType::Up), (2, SignalType::Up)];
        let result = evaluate_signals(&frame(&prices, &signals), 3, &one_horizon()).unwrap();
        assert_eq!(result.horizons[0].n_up, 1);
        assert_eq!(result.chain_statistics.median_chain_length, Some(3.0));
    }

    #[test]
    fn test_terminal_without_forward_price_dropped() {
        let prices = vec![100.0; 10];
        let signals = vec![(9, SignalType::Down)];
        let result = evaluate_signals(&frame(&prices, &signals), 3, &one_horizon()).unwrap();
        assert_eq!(result.horizons[0].n_down, 0);
        assert_eq!(result.horizons[0].median_down, None);
    }

    /// Up terminals at 0, 10, 20 and down terminals at 30, 40, 50. Each
    /// entry of `moves` gives the forward price offsets `(horizon, offset)`
    /// of one signal; up signals use the offsets negated.
    fn ramp_frame(moves: &[[(usize, f64); 3]]) -> SignalFrame {
        let mut prices = vec![100.0; 60];
        let mut signals = Vec::new();
        for (k, offsets) in moves.iter().enumerate() {
            let up_at = 10 * k;
            let down_at = 10 * k + 30;
            for &(h, off) in offsets {
                prices[up_at + h] = 100.0 - off;
                prices[down_at + h] = 100.0 + off;
            }
            signals.push((up_at, SignalType::Up));
            signals.push((down_at, SignalType::Down));
        }
        frame(&prices, &signals)
    }

    #[test]
    fn test_representative_return_is_median_of_horizon_medians() {
        let scales = [0.8, 1.0, 1.2];
        let moves: Vec<[(usize, f64); 3]> = scales
            .iter()
            .map(|s| [(1, s * 1.0), (3, s * 3.0), (5, s * 5.0)])
            .collect();
        let cfg = ValidationConfig {
            horizons: vec![1, 3, 5],
            significance_threshold: 0.05,
            test_kind: TTestKind::Student,
        };
        let result = evaluate_signals(&ramp_frame(&moves), 3, &cfg).unwrap();

        let down: Vec<f64> = result.horizons.iter().map(|h| h.median_down.unwrap()).collect();
        assert!((down[0] - 1.0).abs() < 1e-9);
        assert!((down[1] - 3.0).abs() < 1e-9);
        assert!((down[2] - 5.0).abs() < 1e-9);

        let p: Vec<f64> = result.horizons.iter().map(|h| h.p_value.unwrap()).collect();
        let expected_mean = p.iter().sum::<f64>() / 3.0;
        assert!((result.mean_p_value.unwrap() - expected_mean).abs() < 1e-12);
        assert!(result.accept);
        assert!((result.representative_return.unwrap() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_significant_horizon_does_not_accept() {
        // Horizon 1 separates the groups; horizon 2 sees the same
        // +1 / -1 / 0 responses in both, so its p-value is 1
        let second = [1.0, -1.0, 0.0];
        let mut prices = vec![100.0; 60];
        let mut signals = Vec::new();
        for (k, (m, r)) in [5.0, 4.0, 6.0].iter().zip(second.iter()).enumerate() {
            let up_at = 10 * k;
            let down_at = 10 * k + 30;
            prices[up_at + 1] = 100.0 - m;
            prices[down_at + 1] = 100.0 + m;
            prices[up_at + 2] = 100.0 + r;
            prices[down_at + 2] = 100.0 + r;
            signals.push((up_at, SignalType::Up));
            signals.push((down_at, SignalType::Down));
        }
        let cfg = ValidationConfig {
            horizons: vec![1, 2],
            significance_threshold: 0.05,
            test_kind: TTestKind::Student,
        };
        let result = evaluate_signals(&frame(&prices, &signals), 3, &cfg).unwrap();

        let p1 = result.horizons[0].p_value.unwrap();
        let p2 = result.horizons[1].p_value.unwrap();
        assert!(p1 < 0.05);
        assert!((p2 - 1.0).abs() < 1e-12);
        assert!((result.mean_p_value.unwrap() - (p1 + p2) / 2.0).abs() < 1e-12);
        assert!(!result.accept);
        assert_eq!(result.representative_return, None);
    }

    #[test]
    fn test_all_directions_hold_requires_every_check() {
        // Every direction check fails: up signals rise, down signals fall
        let moves: Vec<[(usize, f64); 3]> = [0.8, 1.0, 1.2]
            .iter()
            .map(|s| [(1, -s), (3, -3.0 * s), (5, -5.0 * s)])
            .collect();
        let cfg = ValidationConfig {
            horizons: vec![1, 3, 5],
            ..ValidationConfig::default()
        };
        let result = evaluate_signals(&ramp_frame(&moves), 3, &cfg).unwrap();
        assert!(result.horizons.iter().all(|h| !h.up_reverts && !h.down_reverts));
        assert!(!result.all_directions_hold);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let cfg = ValidationConfig {
            horizons: vec![],
            ..ValidationConfig::default()
        };
        assert!(matches!(
            evaluate_signals(&separated_frame(), 3, &cfg),
            Err(PairsError::ConfigurationError { .. })
        ));
    }
}
