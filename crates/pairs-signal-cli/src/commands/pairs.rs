use std::time::Instant;

use clap::Args;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use pairs_signal_core::pairs::analyzer::{analyze_pair, PairAnalysisInput, PairAnalyzer};
use pairs_signal_core::pairs::chains::{summarize_chains, ChainSummary, ChainedSignal};
use pairs_signal_core::pairs::config::AnalysisConfig;
use pairs_signal_core::pairs::signals::SignalFrame;
use pairs_signal_core::with_metadata;

use crate::input;

/// Where the pair and its configuration come from
#[derive(Args)]
pub struct PairArgs {
    /// Path to a JSON or YAML analysis input (pair plus optional config)
    #[arg(long, conflicts_with = "prices")]
    pub input: Option<String>,

    /// Path to a price CSV with a Date column and one column per symbol
    #[arg(long, requires_all = ["asset_1", "asset_2"])]
    pub prices: Option<String>,

    /// Symbol of the traded leg (with --prices)
    #[arg(long = "asset-1")]
    pub asset_1: Option<String>,

    /// Symbol of the hedge leg (with --prices)
    #[arg(long = "asset-2")]
    pub asset_2: Option<String>,

    /// JSON or YAML configuration overriding the input's config
    #[arg(long)]
    pub config: Option<String>,
}

#[derive(Serialize)]
struct SignalsReport {
    signals: SignalFrame,
    chains: Vec<ChainedSignal>,
    chain_summaries: Vec<ChainSummary>,
}

/// Resolve the analysis input from `--input`, `--prices` or stdin.
///
/// A price CSV without `--config` runs with every stage enabled.
pub fn load_input(args: &PairArgs) -> Result<PairAnalysisInput, Box<dyn std::error::Error>> {
    let mut pair_input: PairAnalysisInput = if let Some(ref path) = args.input {
        input::file::read_document(path)?
    } else if let Some(ref path) = args.prices {
        let (asset_1, asset_2) = match (&args.asset_1, &args.asset_2) {
            (Some(a), Some(b)) => (a, b),
            _ => return Err("--prices requires --asset-1 and --asset-2".into()),
        };
        PairAnalysisInput {
            pair: input::prices::read_price_pair(path, asset_1, asset_2)?,
            config: AnalysisConfig::with_all_stages(),
        }
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        return Err("--input <file>, --prices <file.csv> or stdin required".into());
    };

    if let Some(ref path) = args.config {
        debug!(path = %path, "overriding analysis config");
        pair_input.config = input::file::read_document(path)?;
    }
    debug!(
        asset_1 = %pair_input.pair.asset_1,
        asset_2 = %pair_input.pair.asset_2,
        observations = pair_input.pair.len(),
        "loaded pair"
    );
    Ok(pair_input)
}

pub fn run_analyze(args: PairArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let pair_input = load_input(&args)?;
    let result = analyze_pair(&pair_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_cointegration(args: PairArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let pair_input = load_input(&args)?;
    let analyzer = PairAnalyzer::new(pair_input.pair)?;

    let mut warnings = Vec::new();
    if !analyzer.cointegration().is_cointegrated {
        warnings.push("pair is not cointegrated at the 5% level".to_string());
    }
    let output = with_metadata(
        "Engle-Granger cointegration test",
        &pair_input.config,
        warnings,
        start.elapsed().as_micros() as u64,
        analyzer.cointegration().clone(),
    );
    Ok(serde_json::to_value(output)?)
}

pub fn run_signals(args: PairArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let pair_input = load_input(&args)?;
    let config = &pair_input.config;
    let analyzer = PairAnalyzer::new(pair_input.pair.clone())?;

    let signals = analyzer.produce_zscore(&config.zscore)?;
    let chains = analyzer.detect_chains(&signals, &config.chains)?;
    let chain_summaries = summarize_chains(&chains);

    let output = with_metadata(
        "Rolling spread z-score signals with gap-tolerant chaining",
        config,
        Vec::new(),
        start.elapsed().as_micros() as u64,
        SignalsReport {
            signals,
            chains,
            chain_summaries,
        },
    );
    Ok(serde_json::to_value(output)?)
}
