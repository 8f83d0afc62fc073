use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::stats::adf::{self, AdfTrend};
use crate::stats::mackinnon::{self, CriticalValues};
use crate::stats::ols;
use crate::{PairsError, PairsResult};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Outcome of the Engle-Granger test plus the trading hedge ratio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CointegrationResult {
    /// p-value below 5% and statistic below the 5% critical value
    pub is_cointegrated: bool,
    /// Slope of series 1 on series 2 without intercept
    pub hedge_ratio: f64,
    /// ADF statistic of the Engle-Granger residuals (-inf when collinear)
    pub test_statistic: f64,
    /// MacKinnon asymptotic p-value
    pub p_value: f64,
    pub critical_values: CriticalValues,
    /// Lag order chosen for the residual ADF; `None` when collinear
    pub used_lag: Option<usize>,
    pub nobs: usize,
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Shortest series accepted by the cointegration test.
pub const MIN_OBSERVATIONS: usize = 30;

const SIGNIFICANCE: f64 = 0.05;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run an Engle-Granger cointegration test of series 1 on series 2 and
/// estimate the hedge ratio.
pub fn test_cointegration(series_1: &[f64], series_2: &[f64]) -> PairsResult<CointegrationResult> {
    // ------------------------------------------------------------------
    // 1. Validate inputs
    // ------------------------------------------------------------------
    let n = series_1.len();
    if series_2.len() != n {
        return Err(PairsError::InvalidInput {
            field: "series_2".into(),
            reason: format!("series 2 has {} values but series 1 has {}", series_2.len(), n),
        });
    }
    if n < MIN_OBSERVATIONS {
        return Err(PairsError::InsufficientData(format!(
            "At least {} observations required for cointegration, got {}",
            MIN_OBSERVATIONS, n
        )));
    }
    check_regressable("series_1", series_1)?;
    check_regressable("series_2", series_2)?;

    // ------------------------------------------------------------------
    // 2. Hedge ratio: OLS through the origin
    // ------------------------------------------------------------------
    let hedge_ratio = ols::slope_through_origin(series_1, series_2)?;

    // ------------------------------------------------------------------
    // 3. Engle-Granger: cointegrating regression with a constant, then ADF
    //    on its residuals
    // ------------------------------------------------------------------
    let fit = ols::fit(series_1, &[series_2.to_vec(), vec![1.0; n]])?;
    let (test_statistic, used_lag) = if fit.rsquared >= collinearity_bound() {
        warn!(rsquared = fit.rsquared, "series are almost perfectly collinear");
        (f64::NEG_INFINITY, None)
    } else {
        let reg = adf::adf_regression(&fit.residuals, AdfTrend::NoConstant, None)?;
        (reg.statistic, Some(reg.used_lag))
    };

    // ------------------------------------------------------------------
    // 4. MacKinnon p-value and critical values for two variables
    // ------------------------------------------------------------------
    let p_value = mackinnon::p_value(test_statistic, 2)?;
    let critical_values = mackinnon::critical_values(2, n - 1)?;
    let is_cointegrated = verdict(p_value, test_statistic, critical_values.five_pct);

    info!(
        is_cointegrated,
        hedge_ratio,
        test_statistic,
        p_value,
        "cointegration test"
    );

    Ok(CointegrationResult {
        is_cointegrated,
        hedge_ratio,
        test_statistic,
        p_value,
        critical_values,
        used_lag,
        nobs: n,
    })
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Both conditions must hold.
fn verdict(p_value: f64, statistic: f64, critical_5pct: f64) -> bool {
    p_value < SIGNIFICANCE && statistic < critical_5pct
}

fn collinearity_bound() -> f64 {
    1.0 - 100.0 * f64::EPSILON.sqrt()
}

fn check_regressable(field: &str, series: &[f64]) -> PairsResult<()> {
    if let Some(pos) = series.iter().position(|v| !v.is_finite()) {
        return Err(PairsError::numerical(
            "cointegration",
            format!("{} has a non-finite value at position {}", field, pos),
        ));
    }
    let first = series[0];
    if series.iter().all(|v| *v == first) {
        return Err(PairsError::numerical(
            "cointegration",
            format!("{} has zero variance", field),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use statrs::distribution::Normal;

    /// Random walk around 100 and a leg tied to it with hedge ratio 2.
    fn make_cointegrated_prices(n: usize, seed: u64) -> (Vec<f64>, Vec<f64>) {
        let mut rng = StdRng::seed_from_u64(seed);
        let normal = Normal::new(0.0, 1.0).unwrap();
        let mut level = 100.0;
        let mut s1 = Vec::with_capacity(n);
        let mut s2 = Vec::with_capacity(n);
        for _ in 0..n {
            level += rng.sample(normal);
            s2.push(level);
            s1.push(2.0 * level + rng.sample(normal));
        }
        (s1, s2)
    }

    #[test]
    fn test_known_linear_relationship_is_cointegrated() {
        let (s1, s2) = make_cointegrated_prices(100, 42);
        let result = test_cointegration(&s1, &s2).unwrap();
        assert!(result.is_cointegrated, "stat {} p {}", result.test_statistic, result.p_value);
        assert!((result.hedge_ratio - 2.0).abs() < 0.1);
        assert_eq!(result.nobs, 100);
        assert!(result.used_lag.is_some());
    }

    #[test]
    fn test_perfectly_collinear_pair() {
        let s2: Vec<f64> = (0..40).map(|i| 50.0 + (i as f64 * 0.7).sin() * 3.0 + i as f64).collect();
        let s1: Vec<f64> = s2.iter().map(|v| 1.5 * v).collect();
        let result = test_cointegration(&s1, &s2).unwrap();
        assert_eq!(result.test_statistic, f64::NEG_INFINITY);
        assert_eq!(result.p_value, 0.0);
        assert!(result.is_cointegrated);
        assert!((result.hedge_ratio - 1.5).abs() < 1e-12);
        assert_eq!(result.used_lag, None);
    }

    #[test]
    fn test_verdict_requires_both_conditions() {
        assert!(verdict(0.01, -4.0, -3.4));
        // significant p-value, statistic above the critical value
        assert!(!verdict(0.04, -3.3, -3.4));
        // statistic below critical value, p-value not significant
        assert!(!verdict(0.06, -3.5, -3.4));
    }

    #[test]
    fn test_too_few_observations() {
        let s: Vec<f64> = (0..20).map(|i| i as f64 + 1.0).collect();
        let result = test_cointegration(&s, &s);
        assert!(matches!(result, Err(PairsError::InsufficientData(_))));
    }

    #[test]
    fn test_mismatched_lengths() {
        let (s1, mut s2) = make_cointegrated_prices(40, 1);
        s2.pop();
        assert!(matches!(
            test_cointegration(&s1, &s2),
            Err(PairsError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_constant_series_fails() {
        let (s1, _) = make_cointegrated_prices(40, 2);
        let s2 = vec![10.0; 40];
        assert!(matches!(
            test_cointegration(&s1, &s2),
            Err(PairsError::NumericalError { .. })
        ));
    }

    #[test]
    fn test_non_finite_fails() {
        let (mut s1, s2) = make_cointegrated_prices(40, 3);
        s1[5] = f64::INFINITY;
        assert!(matches!(
            test_cointegration(&s1, &s2),
            Err(PairsError::NumericalError { .. })
        ));
    }

    #[test]
    fn test_result_serializes() {
        let (s1, s2) = make_cointegrated_prices(60, 5);
        let result = test_cointegration(&s1, &s2).unwrap();
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("hedge_ratio"));
        assert!(json.contains("five_pct"));
    }
}
