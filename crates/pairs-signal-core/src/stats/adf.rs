use serde::{Deserialize, Serialize};
use tracing::debug;

use super::mackinnon::{self, CriticalValues};
use super::ols;
use crate::{PairsError, PairsResult};

/// Deterministic terms included in the ADF regression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdfTrend {
    /// No constant, used on Engle-Granger residuals
    NoConstant,
    Constant,
}

impl AdfTrend {
    fn n_terms(self) -> usize {
        match self {
            AdfTrend::NoConstant => 0,
            AdfTrend::Constant => 1,
        }
    }
}

/// Raw ADF regression outcome, before any p-value lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdfRegression {
    /// t-value of the lagged level coefficient
    pub statistic: f64,
    /// Number of lagged differences selected by AIC
    pub used_lag: usize,
    /// Observations in the final regression
    pub nobs: usize,
}

/// Augmented Dickey-Fuller test with a constant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdfResult {
    pub statistic: f64,
    pub p_value: f64,
    pub used_lag: usize,
    pub nobs: usize,
    pub critical_values: CriticalValues,
}

/// Schwert rule `ceil(12 * (n/100)^(1/4))`, capped so the autolag search
/// still leaves observations for every candidate regression.
pub fn default_max_lag(nobs: usize, trend: AdfTrend) -> PairsResult<usize> {
    let schwert = (12.0 * (nobs as f64 / 100.0).powf(0.25)).ceil() as usize;
    let cap = (nobs / 2) as i64 - trend.n_terms() as i64 - 1;
    if cap < 0 {
        return Err(PairsError::InsufficientData(format!(
            "ADF regression needs at least {} observations, got {}",
            2 * (trend.n_terms() + 1),
            nobs
        )));
    }
    Ok(schwert.min(cap as usize))
}

/// Regressors for `lags` lagged differences over the sample that starts
/// after `trim` differences.
///
/// Row `r` describes time `t = trim + r`: response `x[t+1] - x[t]`,
/// regressors `x[t]`, `dx[t-1] .. dx[t-lags]` and the optional constant.
fn design(
    x: &[f64],
    dx: &[f64],
    trim: usize,
    lags: usize,
    trend: AdfTrend,
) -> (Vec<f64>, Vec<Vec<f64>>) {
    let rows = dx.len() - trim;
    let response: Vec<f64> = dx[trim..].to_vec();
    let mut columns = Vec::with_capacity(lags + 2);
    columns.push((0..rows).map(|r| x[trim + r]).collect());
    for j in 1..=lags {
        columns.push((0..rows).map(|r| dx[trim + r - j]).collect());
    }
    if trend == AdfTrend::Constant {
        columns.push(vec![1.0; rows]);
    }
    (response, columns)
}

/// Run the ADF regression, choosing the lag order by minimum AIC.
///
/// Every candidate lag is fitted on the common sample implied by `max_lag`
/// so the criteria are comparable; the chosen order is then refitted on the
/// longest sample it allows.
pub fn adf_regression(
    x: &[f64],
    trend: AdfTrend,
    max_lag: Option<usize>,
) -> PairsResult<AdfRegression> {
    let n = x.len();
    let max_lag = match max_lag {
        Some(m) => m,
        None => default_max_lag(n, trend)?,
    };
    if n < max_lag + 3 {
        return Err(PairsError::InsufficientData(format!(
            "ADF with {} lags needs at least {} observations, got {}",
            max_lag,
            max_lag + 3,
            n
        )));
    }
    let dx: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();

    let mut best: Option<(f64, usize)> = None;
    for lags in 0..=max_lag {
        let (y, cols) = design(x, &dx, max_lag, lags, trend);
        let fit = match ols::fit(&y, &cols) {
            Ok(fit) => fit,
            Err(_) => continue,
        };
        if best.map_or(true, |(aic, _)| fit.aic < aic) {
            best = Some((fit.aic, lags));
        }
    }
    let (_, used_lag) = best.ok_or_else(|| {
        PairsError::numerical("ADF lag selection", "no candidate regression could be fitted")
    })?;

    let (y, cols) = design(x, &dx, used_lag, used_lag, trend);
    let fit = ols::fit(&y, &cols)?;
    debug!(used_lag, nobs = fit.nobs, statistic = fit.t_values[0], "ADF regression");

    Ok(AdfRegression {
        statistic: fit.t_values[0],
        used_lag,
        nobs: fit.nobs,
    })
}

/// ADF unit-root test with a constant and AIC lag selection.
pub fn adf_test(x: &[f64], max_lag: Option<usize>) -> PairsResult<AdfResult> {
    let reg = adf_regression(x, AdfTrend::Constant, max_lag)?;
    Ok(AdfResult {
        statistic: reg.statistic,
        p_value: mackinnon::p_value(reg.statistic, 1)?,
        used_lag: reg.used_lag,
        nobs: reg.nobs,
        critical_values: mackinnon::critical_values(1, reg.nobs)?,
    })
}
