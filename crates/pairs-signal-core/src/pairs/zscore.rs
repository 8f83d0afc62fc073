use tracing::{debug, warn};

use crate::stats::adf;
use crate::stats::descriptive::{mean, round_to, sample_std};
use crate::{PairsError, PairsResult};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Hedge-adjusted spread `series_1 - hedge_ratio * series_2`.
pub fn compute_spread(series_1: &[f64], series_2: &[f64], hedge_ratio: f64) -> PairsResult<Vec<f64>> {
    if series_1.len() != series_2.len() {
        return Err(PairsError::InvalidInput {
            field: "series_2".into(),
            reason: format!(
                "series 2 has {} values but series 1 has {}",
                series_2.len(),
                series_1.len()
            ),
        });
    }
    if !hedge_ratio.is_finite() {
        return Err(PairsError::numerical("spread", "hedge ratio is not finite"));
    }
    Ok(series_1
        .iter()
        .zip(series_2)
        .map(|(a, b)| a - hedge_ratio * b)
        .collect())
}

/// Rolling z-score of the spread.
///
/// The baseline mean and sample standard deviation use the trailing `window`
/// observations (current one included); the numerator is the current value
/// alone. The first `window - 1` entries are `None`, as is any date whose
/// rolling standard deviation is zero.
pub fn rolling_zscore(spread: &[f64], window: usize) -> PairsResult<Vec<Option<f64>>> {
    if window < 2 {
        return Err(PairsError::config("window", "rolling window must be at least 2"));
    }
    if let Some(pos) = spread.iter().position(|v| !v.is_finite()) {
        return Err(PairsError::numerical(
            "z-score",
            format!("spread has a non-finite value at position {}", pos),
        ));
    }

    let mut z = vec![None; spread.len()];
    for end in (window - 1)..spread.len() {
        let slice = &spread[end + 1 - window..=end];
        if let (Some(m), Some(s)) = (mean(slice), sample_std(slice)) {
            if s > 0.0 {
                z[end] = Some((spread[end] - m) / s);
            }
        }
    }
    Ok(z)
}

/// ADF p-value of the defined z-scores, rounded to 4 decimals.
///
/// Diagnostic only: a series the test cannot handle yields `None`.
pub fn zscore_adf_p_value(z_scores: &[Option<f64>]) -> Option<f64> {
    let values: Vec<f64> = z_scores.iter().flatten().copied().collect();
    match adf::adf_test(&values, None) {
        Ok(result) => {
            let p = round_to(result.p_value, 4);
            debug!(p_value = p, used_lag = result.used_lag, "z-score ADF");
            Some(p)
        }
        Err(e) => {
            warn!(error = %e, observations = values.len(), "z-score ADF unavailable");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
