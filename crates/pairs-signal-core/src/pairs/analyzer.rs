use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::chains::{detect_chains, signal_points, summarize_chains, ChainSummary, ChainedSignal};
use super::cointegration::{test_cointegration, CointegrationResult};
use super::config::{AnalysisConfig, ChainConfig, ZScoreConfig};
use super::signals::{frame_from_spread, SignalFrame};
use super::zscore::compute_spread;
use crate::types::{with_metadata, AlignedSeriesPair, ComputationOutput};
use crate::PairsResult;

#[cfg(feature = "backtest")]
use super::backtest::{run_backtest, BacktestResult};
#[cfg(feature = "backtest")]
use super::config::BacktestConfig;
#[cfg(feature = "validation")]
use super::config::ValidationConfig;
#[cfg(feature = "validation")]
use super::validation::{self, ValidationResult};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A pair together with its cointegration fit and spread.
#[derive(Debug, Clone)]
pub struct PairAnalyzer {
    pair: AlignedSeriesPair,
    cointegration: CointegrationResult,
    spread: Vec<f64>,
}

/// Input for a full pair analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairAnalysisInput {
    #[serde(flatten)]
    pub pair: AlignedSeriesPair,
    #[serde(default)]
    pub config: AnalysisConfig,
}

/// Everything a pair analysis produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairAnalysisOutput {
    pub cointegration: CointegrationResult,
    pub signals: SignalFrame,
    pub chains: Vec<ChainedSignal>,
    pub chain_summaries: Vec<ChainSummary>,
    /// Present when the validation stage is configured
    #[cfg(feature = "validation")]
    pub validation: Option<ValidationResult>,
    /// Present when the backtest stage is configured
    #[cfg(feature = "backtest")]
    pub backtest: Option<BacktestResult>,
}

// ---------------------------------------------------------------------------
// PairAnalyzer
// ---------------------------------------------------------------------------

impl PairAnalyzer {
    /// Validate the pair, test it for cointegration and build its spread.
    pub fn new(pair: AlignedSeriesPair) -> PairsResult<Self> {
        pair.validate()?;
        let cointegration = test_cointegration(&pair.series_1, &pair.series_2)?;
        let spread = compute_spread(&pair.series_1, &pair.series_2, cointegration.hedge_ratio)?;
        Ok(Self {
            pair,
            cointegration,
            spread,
        })
    }

    pub fn pair(&self) -> &AlignedSeriesPair {
        &self.pair
    }

    pub fn cointegration(&self) -> &CointegrationResult {
        &self.cointegration
    }

    pub fn spread(&self) -> &[f64] {
        &self.spread
    }

    /// Rolling z-score and raw signal flags over the whole history.
    pub fn produce_zscore(&self, config: &ZScoreConfig) -> PairsResult<SignalFrame> {
        frame_from_spread(
            &self.pair,
            self.cointegration.hedge_ratio,
            &self.spread,
            config,
        )
    }

    /// Chains over every signal of the frame.
    pub fn detect_chains(&self, frame: &SignalFrame, config: &ChainConfig) -> PairsResult<Vec<ChainedSignal>> {
        config.validate()?;
        detect_chains(&signal_points(&frame.rows), config.max_gap_days)
    }

    /// Validate signal quality on the in-sample window (all but the last
    /// `test_size` rows).
    #[cfg(feature = "validation")]
    pub fn evaluate_signals(
        &self,
        frame: &SignalFrame,
        config: &AnalysisConfig,
        validation: &ValidationConfig,
    ) -> PairsResult<ValidationResult> {
        config.chains.validate()?;
        let in_sample = frame.in_sample(config.test_size)?;
        validation::evaluate_signals(&in_sample, config.chains.max_gap_days, validation)
    }

    /// Backtest on the last `test_size` rows.
    #[cfg(feature = "backtest")]
    pub fn backtest(
        &self,
        frame: &SignalFrame,
        config: &AnalysisConfig,
        backtest: &BacktestConfig,
    ) -> PairsResult<BacktestResult> {
        config.chains.validate()?;
        let tail = frame.out_of_sample(config.test_size)?;
        run_backtest(&tail, config.chains.max_gap_days, backtest)
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run every configured stage for one pair.
pub fn analyze_pair(input: &PairAnalysisInput) -> PairsResult<ComputationOutput<PairAnalysisOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let config = &input.config;

    // ------------------------------------------------------------------
    // 1. Validate input and configuration
    // ------------------------------------------------------------------
    input.pair.validate()?;
    config.validate(input.pair.len())?;

    // ------------------------------------------------------------------
    // 2. Cointegration and hedge ratio
    // ------------------------------------------------------------------
    let analyzer = PairAnalyzer::new(input.pair.clone())?;
    let coint = analyzer.cointegration();
    if !coint.is_cointegrated {
        warnings.push(format!(
            "{}/{} is not cointegrated (statistic {:.3}, p-value {:.4}); the spread may not revert",
            input.pair.asset_1, input.pair.asset_2, coint.test_statistic, coint.p_value
        ));
    }

    // ------------------------------------------------------------------
    // 3. Spread, z-score, signals and chains
    // ------------------------------------------------------------------
    let signals = analyzer.produce_zscore(&config.zscore)?;
    if signals.zscore_adf_p_value.is_none() {
        warnings.push("z-score stationarity test could not be computed".into());
    }
    let chains = analyzer.detect_chains(&signals, &config.chains)?;
    let chain_summaries = summarize_chains(&chains);

    // ------------------------------------------------------------------
    // 4. Signal validation (in-sample)
    // ------------------------------------------------------------------
    #[cfg(feature = "validation")]
    let validation = match &config.validation {
        Some(v) => {
            let result = analyzer.evaluate_signals(&signals, config, v)?;
            if !result.accept {
                warnings.push(match result.mean_p_value {
                    Some(p) => format!(
                        "signals rejected: mean p-value {:.4} is not below {}",
                        p, result.significance_threshold
                    ),
                    None => "signals rejected: p-value undefined at some horizon".to_string(),
                });
            }
            Some(result)
        }
        None => None,
    };

    // ------------------------------------------------------------------
    // 5. Backtest (out-of-sample)
    // ------------------------------------------------------------------
    #[cfg(feature = "backtest")]
    let backtest = match &config.backtest {
        Some(b) => {
            let result = analyzer.backtest(&signals, config, b)?;
            if result.entries == 0 {
                warnings.push("backtest window holds no down-chain entry".into());
            }
            Some(result)
        }
        None => None,
    };

    let output = PairAnalysisOutput {
        cointegration: analyzer.cointegration().clone(),
        signals,
        chains,
        chain_summaries,
        #[cfg(feature = "validation")]
        validation,
        #[cfg(feature = "backtest")]
        backtest,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Engle-Granger pairs signal analysis",
        config,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
