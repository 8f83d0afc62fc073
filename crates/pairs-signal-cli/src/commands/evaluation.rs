use std::time::Instant;

use serde_json::Value;

use pairs_signal_core::pairs::analyzer::PairAnalyzer;
use pairs_signal_core::with_metadata;

use super::pairs::{load_input, PairArgs};

/// Validate signal quality; runs with default settings when the config has
/// no validation section.
pub fn run_validate(args: PairArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let pair_input = load_input(&args)?;
    let config = &pair_input.config;
    config.validate(pair_input.pair.len())?;
    let validation = config.validation.clone().unwrap_or_default();

    let analyzer = PairAnalyzer::new(pair_input.pair.clone())?;
    let signals = analyzer.produce_zscore(&config.zscore)?;
    let result = analyzer.evaluate_signals(&signals, config, &validation)?;

    let mut warnings = Vec::new();
    if !result.accept {
        warnings.push("signals rejected: no significant up/down separation".to_string());
    }
    if !result.all_directions_hold {
        warnings.push("median forward returns do not revert in every direction".to_string());
    }
    let output = with_metadata(
        "Two-sample t-test of forward returns after chain-terminal signals",
        &validation,
        warnings,
        start.elapsed().as_micros() as u64,
        result,
    );
    Ok(serde_json::to_value(output)?)
}

/// Backtest the down-chain strategy; runs with default settings when the
/// config has no backtest section.
pub fn run_backtest(args: PairArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let pair_input = load_input(&args)?;
    let config = &pair_input.config;
    config.validate(pair_input.pair.len())?;
    let backtest = config.backtest.clone().unwrap_or_default();

    let analyzer = PairAnalyzer::new(pair_input.pair.clone())?;
    let signals = analyzer.produce_zscore(&config.zscore)?;
    let result = analyzer.backtest(&signals, config, &backtest)?;

    let mut warnings = Vec::new();
    if result.entries == 0 {
        warnings.push("backtest window holds no down-chain entry".to_string());
    }
    let output = with_metadata(
        "Down-chain holding strategy vs buy-and-hold (log returns)",
        &backtest,
        warnings,
        start.elapsed().as_micros() as u64,
        result,
    );
    Ok(serde_json::to_value(output)?)
}
