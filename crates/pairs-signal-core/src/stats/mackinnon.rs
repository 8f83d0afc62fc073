//! MacKinnon response surfaces for Dickey-Fuller type statistics with a
//! constant term.
//!
//! P-values follow MacKinnon (1994) "Approximate asymptotic distribution
//! functions for unit-root and cointegration tests"; critical values follow
//! MacKinnon (2010) "Critical values for cointegration tests". Index 0 is the
//! univariate ADF case, index 1 the two-variable Engle-Granger case.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::{PairsError, PairsResult};

/// Test statistic critical values at the conventional levels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriticalValues {
    pub one_pct: f64,
    pub five_pct: f64,
    pub ten_pct: f64,
}

const MAX_VARIABLES: usize = 2;

const TAU_MAX_C: [f64; MAX_VARIABLES] = [2.74, 0.92];
const TAU_MIN_C: [f64; MAX_VARIABLES] = [-18.83, -18.86];
const TAU_STAR_C: [f64; MAX_VARIABLES] = [-1.61, -2.62];

const TAU_C_SMALLP: [[f64; 3]; MAX_VARIABLES] = [
    [2.1659, 1.4412, 3.8269e-2],
    [2.92, 1.5012, 3.9796e-2],
];

const TAU_C_LARGEP: [[f64; 4]; MAX_VARIABLES] = [
    [1.7339, 9.3202e-1, -1.2745e-1, -1.0368e-2],
    [2.1945, 6.4695e-1, -2.9198e-1, -4.2377e-2],
];

// Rows: 1%, 5%, 10%. Columns: coefficients on 1, 1/T, 1/T^2, 1/T^3.
const TAU_C_2010: [[[f64; 4]; 3]; MAX_VARIABLES] = [
    [
        [-3.43035, -6.5393, -16.786, -79.433],
        [-2.86154, -2.8903, -4.234, -40.040],
        [-2.56677, -1.5384, -2.809, 0.0],
    ],
    [
        [-3.89644, -10.9519, -33.527, 0.0],
        [-3.33613, -6.1101, -6.823, 0.0],
        [-3.04445, -4.2412, -2.720, 0.0],
    ],
];

fn table_index(n_vars: usize) -> PairsResult<usize> {
    if n_vars == 0 || n_vars > MAX_VARIABLES {
        return Err(PairsError::numerical(
            "MacKinnon tables",
            format!("supported for 1 to {} variables, got {}", MAX_VARIABLES, n_vars),
        ));
    }
    Ok(n_vars - 1)
}

fn polyval(coefs: &[f64], x: f64) -> f64 {
    coefs.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

/// Approximate asymptotic p-value of a Dickey-Fuller statistic.
pub fn p_value(statistic: f64, n_vars: usize) -> PairsResult<f64> {
    let idx = table_index(n_vars)?;
    if statistic.is_nan() {
        return Err(PairsError::numerical(
            "MacKinnon p-value",
            "test statistic is undefined",
        ));
    }
    if statistic > TAU_MAX_C[idx] {
        return Ok(1.0);
    }
    if statistic < TAU_MIN_C[idx] {
        return Ok(0.0);
    }
    let z = if statistic <= TAU_STAR_C[idx] {
        polyval(&TAU_C_SMALLP[idx], statistic)
    } else {
        polyval(&TAU_C_LARGEP[idx], statistic)
    };
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| PairsError::numerical("MacKinnon p-value", e.to_string()))?;
    Ok(normal.cdf(z))
}

/// Finite-sample critical values for `nobs` observations.
pub fn critical_values(n_vars: usize, nobs: usize) -> PairsResult<CriticalValues> {
    let idx = table_index(n_vars)?;
    let inv = 1.0 / nobs as f64;
    let table = &TAU_C_2010[idx];
    Ok(CriticalValues {
        one_pct: polyval(&table[0], inv),
        five_pct: polyval(&table[1], inv),
        ten_pct: polyval(&table[2], inv),
    })
}
