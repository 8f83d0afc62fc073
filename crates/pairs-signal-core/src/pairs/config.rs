use serde::{Deserialize, Serialize};

use crate::{PairsError, PairsResult};

#[cfg(feature = "validation")]
use crate::stats::hypothesis::TTestKind;

/// Rolling z-score parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZScoreConfig {
    /// Rolling window for the spread mean and standard deviation (>= 2)
    #[serde(default = "default_window")]
    pub window: usize,
    /// Absolute z-score at which a raw signal fires (> 0)
    #[serde(default = "default_z_threshold")]
    pub z_threshold: f64,
}

impl Default for ZScoreConfig {
    fn default() -> Self {
        Self {
            window: default_window(),
            z_threshold: default_z_threshold(),
        }
    }
}

/// Gap tolerance used when grouping raw signals into chains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Largest number of calendar days allowed strictly between two
    /// consecutive signal dates of the same chain
    #[serde(default = "default_max_gap_days")]
    pub max_gap_days: i64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            max_gap_days: default_max_gap_days(),
        }
    }
}

#[cfg(feature = "validation")]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Forward-return horizons in observations, strictly increasing
    #[serde(default = "default_horizons")]
    pub horizons: Vec<usize>,
    /// Mean p-value below which the pair is accepted
    #[serde(default = "default_significance_threshold")]
    pub significance_threshold: f64,
    #[serde(default)]
    pub test_kind: TTestKind,
}

#[cfg(feature = "validation")]
impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            horizons: default_horizons(),
            significance_threshold: default_significance_threshold(),
            test_kind: TTestKind::default(),
        }
    }
}

#[cfg(feature = "backtest")]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// Observations the position is held after each entry
    #[serde(default = "default_days_strategy")]
    pub days_strategy: usize,
}

#[cfg(feature = "backtest")]
impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            days_strategy: default_days_strategy(),
        }
    }
}

/// Full analysis configuration. A `None` stage is skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub zscore: ZScoreConfig,
    #[serde(default)]
    pub chains: ChainConfig,
    /// Most recent observations held out for the backtest; validation uses
    /// everything before them
    #[serde(default = "default_test_size")]
    pub test_size: usize,
    #[cfg(feature = "validation")]
    #[serde(default)]
    pub validation: Option<ValidationConfig>,
    #[cfg(feature = "backtest")]
    #[serde(default)]
    pub backtest: Option<BacktestConfig>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            zscore: ZScoreConfig::default(),
            chains: ChainConfig::default(),
            test_size: default_test_size(),
            #[cfg(feature = "validation")]
            validation: None,
            #[cfg(feature = "backtest")]
            backtest: None,
        }
    }
}

impl AnalysisConfig {
    /// Default parameters with every compiled-in stage enabled.
    pub fn with_all_stages() -> Self {
        Self {
            #[cfg(feature = "validation")]
            validation: Some(ValidationConfig::default()),
            #[cfg(feature = "backtest")]
            backtest: Some(BacktestConfig::default()),
            ..Self::default()
        }
    }
}

fn default_window() -> usize {
    20
}

fn default_z_threshold() -> f64 {
    2.0
}

fn default_max_gap_days() -> i64 {
    3
}

fn default_test_size() -> usize {
    60
}

#[cfg(feature = "validation")]
fn default_horizons() -> Vec<usize> {
    vec![1, 3, 5, 10]
}

#[cfg(feature = "validation")]
fn default_significance_threshold() -> f64 {
    0.05
}

#[cfg(feature = "backtest")]
fn default_days_strategy() -> usize {
    5
}

impl ZScoreConfig {
    pub fn validate(&self, series_len: usize) -> PairsResult<()> {
        if self.window < 2 {
            return Err(PairsError::config("window", "rolling window must be at least 2"));
        }
        if self.window >= series_len {
            return Err(PairsError::config(
                "window",
                format!(
                    "rolling window {} must be shorter than the series ({} observations)",
                    self.window, series_len
                ),
            ));
        }
        if !self.z_threshold.is_finite() || self.z_threshold <= 0.0 {
            return Err(PairsError::config("z_threshold", "z-score threshold must be positive"));
        }
        Ok(())
    }
}

impl ChainConfig {
    pub fn validate(&self) -> PairsResult<()> {
        if self.max_gap_days < 0 {
            return Err(PairsError::config("max_gap_days", "gap tolerance must be non-negative"));
        }
        Ok(())
    }
}

#[cfg(feature = "validation")]
impl ValidationConfig {
    pub fn validate(&self) -> PairsResult<()> {
        if self.horizons.is_empty() {
            return Err(PairsError::config("horizons", "at least one horizon is required"));
        }
        if self.horizons.contains(&0) {
            return Err(PairsError::config("horizons", "horizons must be positive"));
        }
        if self.horizons.windows(2).any(|w| w[1] <= w[0]) {
            return Err(PairsError::config("horizons", "horizons must be strictly increasing"));
        }
        let t = self.significance_threshold;
        if !(t > 0.0 && t < 1.0) {
            return Err(PairsError::config(
                "significance_threshold",
                "significance threshold must lie in (0, 1)",
            ));
        }
        Ok(())
    }
}

#[cfg(feature = "backtest")]
impl BacktestConfig {
    pub fn validate(&self) -> PairsResult<()> {
        if self.days_strategy == 0 {
            return Err(PairsError::config("days_strategy", "holding horizon must be at least 1"));
        }
        Ok(())
    }
}

impl AnalysisConfig {
    /// Check every configured stage against a series of `series_len` points.
    pub fn validate(&self, series_len: usize) -> PairsResult<()> {
        self.zscore.validate(series_len)?;
        self.chains.validate()?;
        self.validate_test_size(series_len)?;
        #[cfg(feature = "validation")]
        if let Some(v) = &self.validation {
            v.validate()?;
        }
        #[cfg(feature = "backtest")]
        if let Some(b) = &self.backtest {
            b.validate()?;
        }
        Ok(())
    }

    pub fn validate_test_size(&self, series_len: usize) -> PairsResult<()> {
        if self.test_size == 0 {
            return Err(PairsError::config("test_size", "test size must be at least 1"));
        }
        if self.test_size >= series_len {
            return Err(PairsError::config(
                "test_size",
                format!(
                    "test size {} exceeds the available history of {} observations",
                    self.test_size, series_len
                ),
            ));
        }
        Ok(())
    }
}
