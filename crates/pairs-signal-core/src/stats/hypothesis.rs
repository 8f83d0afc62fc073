use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};

use super::descriptive::{mean, sample_std};
use crate::{PairsError, PairsResult};

/// Variance assumption of the two-sample t-test.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TTestKind {
    /// Pooled variance (equal variances assumed)
    #[default]
    Student,
    /// Unequal variances with Welch-Satterthwaite degrees of freedom
    Welch,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TTestResult {
    pub statistic: f64,
    pub degrees_of_freedom: f64,
    /// Two-sided p-value
    pub p_value: f64,
}

/// Two-sample t-test on the difference of means `mean(a) - mean(b)`.
///
/// Returns `Ok(None)` when the test is undefined: either group has fewer than
/// two observations, or both groups are constant with equal means.
pub fn two_sample_t_test(a: &[f64], b: &[f64], kind: TTestKind) -> PairsResult<Option<TTestResult>> {
    let (n1, n2) = (a.len(), b.len());
    let (m1, m2, s1, s2) = match (mean(a), mean(b), sample_std(a), sample_std(b)) {
        (Some(m1), Some(m2), Some(s1), Some(s2)) => (m1, m2, s1, s2),
        _ => return Ok(None),
    };
    let (v1, v2) = (s1 * s1, s2 * s2);
    let (n1f, n2f) = (n1 as f64, n2 as f64);

    let (std_err, df) = match kind {
        TTestKind::Student => {
            let df = n1f + n2f - 2.0;
            let pooled = ((n1f - 1.0) * v1 + (n2f - 1.0) * v2) / df;
            ((pooled * (1.0 / n1f + 1.0 / n2f)).sqrt(), df)
        }
        TTestKind::Welch => {
            let (q1, q2) = (v1 / n1f, v2 / n2f);
            let df = (q1 + q2).powi(2) / (q1 * q1 / (n1f - 1.0) + q2 * q2 / (n2f - 1.0));
            ((q1 + q2).sqrt(), df)
        }
    };

    let diff = m1 - m2;
    if std_err == 0.0 {
        if diff == 0.0 {
            return Ok(None);
        }
        return Ok(Some(TTestResult {
            statistic: diff.signum() * f64::INFINITY,
            degrees_of_freedom: df,
            p_value: 0.0,
        }));
    }

    let statistic = diff / std_err;
    let dist = StudentsT::new(0.0, 1.0, df)
        .map_err(|e| PairsError::numerical("t-test", e.to_string()))?;
    let p_value = (2.0 * dist.cdf(-statistic.abs())).min(1.0);

    Ok(Some(TTestResult {
        statistic,
        degrees_of_freedom: df,
        p_value,
    }))
}
