use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::config::ZScoreConfig;
use super::zscore::{compute_spread, rolling_zscore, zscore_adf_p_value};
use crate::types::{AlignedSeriesPair, SignalType};
use crate::{PairsError, PairsResult};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One dated observation of the augmented pair frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRow {
    pub date: NaiveDate,
    pub price_1: f64,
    pub price_2: f64,
    pub spread: f64,
    /// `None` during the warm-up window or when the rolling std is zero
    pub z_score: Option<f64>,
    /// z-score at or above the threshold
    pub up_signal: bool,
    /// z-score at or below minus the threshold
    pub low_signal: bool,
}

impl SignalRow {
    /// Direction of the row's signal, if any.
    pub fn signal_type(&self) -> Option<SignalType> {
        match (self.up_signal, self.low_signal) {
            (true, _) => Some(SignalType::Up),
            (false, true) => Some(SignalType::Down),
            (false, false) => None,
        }
    }
}

/// Spread, z-score and raw signal flags for every date of a pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalFrame {
    pub asset_1: String,
    pub asset_2: String,
    pub hedge_ratio: f64,
    /// Informational ADF p-value of the z-score series
    pub zscore_adf_p_value: Option<f64>,
    pub rows: Vec<SignalRow>,
}

impl SignalFrame {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Prices of the traded leg.
    pub fn prices_1(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.price_1).collect()
    }

    /// Every row except the last `test_size`.
    pub fn in_sample(&self, test_size: usize) -> PairsResult<SignalFrame> {
        let cut = self.split_point(test_size)?;
        Ok(self.with_rows(self.rows[..cut].to_vec()))
    }

    /// The last `test_size` rows.
    pub fn out_of_sample(&self, test_size: usize) -> PairsResult<SignalFrame> {
        let cut = self.split_point(test_size)?;
        Ok(self.with_rows(self.rows[cut..].to_vec()))
    }

    fn split_point(&self, test_size: usize) -> PairsResult<usize> {
        if test_size == 0 || test_size >= self.rows.len() {
            return Err(PairsError::config(
                "test_size",
                format!(
                    "test size {} must lie in [1, {})",
                    test_size,
                    self.rows.len()
                ),
            ));
        }
        Ok(self.rows.len() - test_size)
    }

    fn with_rows(&self, rows: Vec<SignalRow>) -> SignalFrame {
        SignalFrame {
            asset_1: self.asset_1.clone(),
            asset_2: self.asset_2.clone(),
            hedge_ratio: self.hedge_ratio,
            zscore_adf_p_value: self.zscore_adf_p_value,
            rows,
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Threshold z-scores into `(up_signal, low_signal)` flags. Missing
/// z-scores never signal.
pub fn threshold_signals(z_scores: &[Option<f64>], z_threshold: f64) -> PairsResult<Vec<(bool, bool)>> {
    if !z_threshold.is_finite() || z_threshold <= 0.0 {
        return Err(PairsError::config("z_threshold", "z-score threshold must be positive"));
    }
    Ok(z_scores
        .iter()
        .map(|z| match z {
            Some(z) => (*z >= z_threshold, *z <= -z_threshold),
            None => (false, false),
        })
        .collect())
}

/// Build the signal frame of a pair for a given hedge ratio.
pub fn build_signal_frame(
    pair: &AlignedSeriesPair,
    hedge_ratio: f64,
    config: &ZScoreConfig,
) -> PairsResult<SignalFrame> {
    let spread = compute_spread(&pair.series_1, &pair.series_2, hedge_ratio)?;
    frame_from_spread(pair, hedge_ratio, &spread, config)
}

/// Build the signal frame from an already computed spread.
pub fn frame_from_spread(
    pair: &AlignedSeriesPair,
    hedge_ratio: f64,
    spread: &[f64],
    config: &ZScoreConfig,
) -> PairsResult<SignalFrame> {
    config.validate(pair.len())?;
    if spread.len() != pair.len() {
        return Err(PairsError::InvalidInput {
            field: "spread".into(),
            reason: format!("expected {} values, got {}", pair.len(), spread.len()),
        });
    }

    let z_scores = rolling_zscore(spread, config.window)?;
    let flags = threshold_signals(&z_scores, config.z_threshold)?;
    let zscore_adf_p_value = zscore_adf_p_value(&z_scores);

    let rows = (0..pair.len())
        .map(|i| SignalRow {
            date: pair.dates[i],
            price_1: pair.series_1[i],
            price_2: pair.series_2[i],
            spread: spread[i],
            z_score: z_scores[i],
            up_signal: flags[i].0,
            low_signal: flags[i].1,
        })
        .collect();

    Ok(SignalFrame {
        asset_1: pair.asset_1.clone(),
        asset_2: pair.asset_2.clone(),
        hedge_ratio,
        zscore_adf_p_value,
        rows,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(offset)
    }

    fn sample_pair(n: usize) -> AlignedSeriesPair {
        let dates = (0..n as i64).map(day).collect();
        let s2: Vec<f64> = (0..n).map(|i| 50.0 + (i as f64 * 0.3).sin()).collect();
        let s1: Vec<f64> = s2
            .iter()
            .enumerate()
            .map(|(i, v)| 2.0 * v + (i as f64 * 1.7).cos())
            .collect();
        AlignedSeriesPair::new("AAA", "BBB", dates, s1, s2).unwrap()
    }

    #[test]
    fn test_threshold_flags() {
        let z = [None, Some(0.0), Some(3.0), Some(-3.0), Some(2.99)];
        let flags = threshold_signals(&z, 3.0).unwrap();
        assert_eq!(
            flags,
            vec![(false, false), (false, false), (true, false), (false, true), (false, false)]
        );
    }

    #[test]
    fn test_threshold_must_be_positive() {
        assert!(threshold_signals(&[Some(1.0)], 0.0).is_err());
        assert!(threshold_signals(&[Some(1.0)], f64::NAN).is_err());
    }

    #[test]
    fn test_signal_type_of_row() {
        let mut row = SignalRow {
            date: day(0),
            price_1: 1.0,
            price_2: 1.0,
            spread: 0.0,
            z_score: None,
            up_signal: false,
            low_signal: false,
        };
        assert_eq!(row.signal_type(), None);
        row.low_signal = true;
        assert_eq!(row.signal_type(), Some(SignalType::Down));
        row.low_signal = false;
        row.up_signal = true;
        assert_eq!(row.signal_type(), Some(SignalType::Up));
    }

    #[test]
    fn test_build_frame_shape() {
        let pair = sample_pair(40);
        let cfg = ZScoreConfig {
            window: 5,
            z_threshold: 1.0,
        };
        let frame = build_signal_frame(&pair, 2.0, &cfg).unwrap();
        assert_eq!(frame.len(), 40);
        assert!(frame.rows[..4].iter().all(|r| r.z_score.is_none()));
        for (i, row) in frame.rows.iter().enumerate() {
            assert_eq!(row.spread, pair.series_1[i] - 2.0 * pair.series_2[i]);
            assert!(!(row.up_signal && row.low_signal));
        }
    }

    #[test]
    fn test_build_frame_rejects_long_window() {
        let pair = sample_pair(10);
        let cfg = ZScoreConfig {
            window: 10,
            z_threshold: 1.0,
        };
        assert!(matches!(
            build_signal_frame(&pair, 1.0, &cfg),
            Err(PairsError::ConfigurationError { .. })
        ));
    }

    #[test]
    fn test_split_in_and_out_of_sample() {
        let pair = sample_pair(30);
        let frame = build_signal_frame(&pair, 2.0, &ZScoreConfig { window: 5, z_threshold: 1.0 }).unwrap();
        let head = frame.in_sample(10).unwrap();
        let tail = frame.out_of_sample(10).unwrap();
        assert_eq!(head.len(), 20);
        assert_eq!(tail.len(), 10);
        assert_eq!(tail.rows[0].date, day(20));
        assert!(frame.in_sample(30).is_err());
        assert!(frame.out_of_sample(0).is_err());
    }
}
