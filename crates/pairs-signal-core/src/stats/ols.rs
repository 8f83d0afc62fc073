use nalgebra::{DMatrix, DVector};

use crate::{PairsError, PairsResult};

const RANK_TOLERANCE: f64 = 1e-12;

/// Fitted ordinary least squares model.
#[derive(Debug, Clone)]
pub struct OlsFit {
    pub params: Vec<f64>,
    pub std_errors: Vec<f64>,
    pub t_values: Vec<f64>,
    pub residuals: Vec<f64>,
    /// Sum of squared residuals
    pub ssr: f64,
    pub nobs: usize,
    /// Centered R-squared (assumes the design carries a constant)
    pub rsquared: f64,
    /// Akaike information criterion from the Gaussian log-likelihood
    pub aic: f64,
}

/// Fit `y = X b + e` where each entry of `columns` is one regressor.
///
/// Solved through the normal equations with a Cholesky factorisation; a
/// rank-deficient design is reported as a `NumericalError`.
pub fn fit(y: &[f64], columns: &[Vec<f64>]) -> PairsResult<OlsFit> {
    let n = y.len();
    let k = columns.len();
    if k == 0 {
        return Err(PairsError::numerical("OLS", "design matrix has no columns"));
    }
    if let Some(col) = columns.iter().find(|c| c.len() != n) {
        return Err(PairsError::numerical(
            "OLS",
            format!("regressor has {} rows, response has {}", col.len(), n),
        ));
    }
    if n <= k {
        return Err(PairsError::InsufficientData(format!(
            "OLS with {} regressors needs more than {} observations, got {}",
            k, k, n
        )));
    }

    let x = DMatrix::from_fn(n, k, |r, c| columns[c][r]);
    let y_vec = DVector::from_column_slice(y);
    let xt = x.transpose();
    let xtx = &xt * &x;
    let diag: Vec<f64> = xtx.diagonal().iter().copied().collect();
    let chol = xtx
        .cholesky()
        .ok_or_else(|| PairsError::numerical("OLS", "design matrix is rank deficient"))?;
    // A pivot that collapses relative to its column norm means collinear regressors.
    let l = chol.l();
    if (0..k).any(|j| l[(j, j)].powi(2) <= RANK_TOLERANCE * diag[j]) {
        return Err(PairsError::numerical("OLS", "design matrix is rank deficient"));
    }
    let xtx_inv = chol.inverse();
    let beta = &xtx_inv * (&xt * &y_vec);

    let resid = &y_vec - &x * &beta;
    let ssr = resid.dot(&resid);
    let df_resid = (n - k) as f64;
    let sigma2 = ssr / df_resid;

    let params: Vec<f64> = beta.iter().copied().collect();
    let std_errors: Vec<f64> = (0..k).map(|j| (sigma2 * xtx_inv[(j, j)]).sqrt()).collect();
    let t_values: Vec<f64> = params
        .iter()
        .zip(std_errors.iter())
        .map(|(b, se)| b / se)
        .collect();

    let y_mean = y.iter().sum::<f64>() / n as f64;
    let tss: f64 = y.iter().map(|v| (v - y_mean).powi(2)).sum();
    let rsquared = if tss > 0.0 { 1.0 - ssr / tss } else { f64::NAN };

    let nf = n as f64;
    let llf = -nf / 2.0 * ((2.0 * std::f64::consts::PI).ln() + (ssr / nf).ln() + 1.0);
    let aic = -2.0 * llf + 2.0 * k as f64;

    Ok(OlsFit {
        params,
        std_errors,
        t_values,
        residuals: resid.iter().copied().collect(),
        ssr,
        nobs: n,
        rsquared,
        aic,
    })
}

/// Slope of `y` on `x` with no intercept: sum(xy) / sum(x^2).
pub fn slope_through_origin(y: &[f64], x: &[f64]) -> PairsResult<f64> {
    if y.len() != x.len() {
        return Err(PairsError::numerical(
            "regression through origin",
            format!("length mismatch {} vs {}", y.len(), x.len()),
        ));
    }
    let sxx: f64 = x.iter().map(|v| v * v).sum();
    if sxx == 0.0 {
        return Err(PairsError::numerical(
            "regression through origin",
            "regressor is identically zero",
        ));
    }
    let sxy: f64 = x.iter().zip(y.iter()).map(|(a, b)| a * b).sum();
    Ok(sxy / sxx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_line_with_constant() {
        let x: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| 3.0 + 2.0 * v).collect();
        let fit = fit(&y, &[x.clone(), vec![1.0; 10]]).unwrap();
        assert!((fit.params[0] - 2.0).abs() < 1e-9);
        assert!((fit.params[1] - 3.0).abs() < 1e-9);
        assert!(fit.ssr < 1e-12);
        assert!((fit.rsquared - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_t_value_matches_hand_computation() {
        // y = b x + e, no constant. b = sum(xy)/sum(x^2)
        let x = vec![1.0, 2.0, 3.0, 4.0];
        let y = vec![1.1, 1.9, 3.2, 3.9];
        let fit = fit(&y, &[x.clone()]).unwrap();
        let sxx: f64 = x.iter().map(|v| v * v).sum();
        let b: f64 = x.iter().zip(&y).map(|(a, c)| a * c).sum::<f64>() / sxx;
        let ssr: f64 = x.iter().zip(&y).map(|(a, c)| (c - b * a).powi(2)).sum();
        let se = (ssr / 3.0 / sxx).sqrt();
        assert!((fit.params[0] - b).abs() < 1e-12);
        assert!((fit.t_values[0] - b / se).abs() < 1e-9);
    }

    #[test]
    fn test_rank_deficient_design() {
        let x = vec![1.0, 2.0, 3.0, 4.0];
        let y = vec![1.0, 2.0, 3.0, 5.0];
        let result = fit(&y, &[x.clone(), x]);
        assert!(result.is_err());
    }

    #[test]
    fn test_too_few_rows() {
        let result = fit(&[1.0, 2.0], &[vec![1.0, 2.0], vec![1.0, 1.0]]);
        assert!(matches!(result, Err(PairsError::InsufficientData(_))));
    }

    #[test]
    fn test_slope_through_origin() {
        let x = vec![1.0, 2.0, 3.0];
        let y = vec![2.0, 4.0, 6.0];
        assert_eq!(slope_through_origin(&y, &x).unwrap(), 2.0);
        assert!(slope_through_origin(&y, &[0.0, 0.0, 0.0]).is_err());
    }
}
