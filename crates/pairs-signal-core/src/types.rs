use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{PairsError, PairsResult};

/// Two price series sharing one ascending date index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedSeriesPair {
    /// Symbol of the traded leg (series 1)
    pub asset_1: String,
    /// Symbol of the hedge leg (series 2)
    pub asset_2: String,
    pub dates: Vec<NaiveDate>,
    pub series_1: Vec<f64>,
    pub series_2: Vec<f64>,
}

impl AlignedSeriesPair {
    pub fn new(
        asset_1: impl Into<String>,
        asset_2: impl Into<String>,
        dates: Vec<NaiveDate>,
        series_1: Vec<f64>,
        series_2: Vec<f64>,
    ) -> PairsResult<Self> {
        let pair = Self {
            asset_1: asset_1.into(),
            asset_2: asset_2.into(),
            dates,
            series_1,
            series_2,
        };
        pair.validate()?;
        Ok(pair)
    }

    /// Build a pair from two independently indexed series.
    ///
    /// Both indices must be identical; no reindexing or filling is attempted.
    pub fn from_indexed(
        asset_1: impl Into<String>,
        dates_1: Vec<NaiveDate>,
        series_1: Vec<f64>,
        asset_2: impl Into<String>,
        dates_2: Vec<NaiveDate>,
        series_2: Vec<f64>,
    ) -> PairsResult<Self> {
        if dates_1.len() != dates_2.len() {
            return Err(PairsError::IndexAlignmentError(format!(
                "series 1 has {} dates but series 2 has {}",
                dates_1.len(),
                dates_2.len()
            )));
        }
        if let Some((pos, (d1, d2))) = dates_1
            .iter()
            .zip(dates_2.iter())
            .enumerate()
            .find(|(_, (d1, d2))| d1 != d2)
        {
            return Err(PairsError::IndexAlignmentError(format!(
                "date mismatch at position {}: {} vs {}",
                pos, d1, d2
            )));
        }
        Self::new(asset_1, asset_2, dates_1, series_1, series_2)
    }

    /// Check the shape invariants: equal lengths, strictly ascending dates,
    /// finite values.
    pub fn validate(&self) -> PairsResult<()> {
        let n = self.dates.len();
        if self.series_1.len() != n || self.series_2.len() != n {
            return Err(PairsError::InvalidInput {
                field: "series".into(),
                reason: format!(
                    "expected {} values per series, got {} and {}",
                    n,
                    self.series_1.len(),
                    self.series_2.len()
                ),
            });
        }
        if let Some(w) = self.dates.windows(2).find(|w| w[1] <= w[0]) {
            return Err(PairsError::InvalidInput {
                field: "dates".into(),
                reason: format!(
                    "dates must be strictly ascending without duplicates ({} followed by {})",
                    w[0], w[1]
                ),
            });
        }
        for (name, series) in [(&self.asset_1, &self.series_1), (&self.asset_2, &self.series_2)] {
            if let Some(pos) = series.iter().position(|v| !v.is_finite()) {
                return Err(PairsError::numerical(
                    "input series",
                    format!("{} has a non-finite value at {}", name, self.dates[pos]),
                ));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Direction of a raw divergence signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalType {
    /// z-score at or above the upper threshold
    Up,
    /// z-score at or below the lower threshold
    Down,
}

impl std::fmt::Display for SignalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalType::Up => write!(f, "up"),
            SignalType::Down => write!(f, "down"),
        }
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "ieee754_f64".to_string(),
        },
    }
}
