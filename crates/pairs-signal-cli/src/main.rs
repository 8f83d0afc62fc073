mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::pairs::PairArgs;

/// Pairs-trading signal detection, validation and backtesting
#[derive(Parser)]
#[command(
    name = "pairsig",
    version,
    about = "Pairs-trading signal detection, validation and backtesting",
    long_about = "Tests two aligned price series for cointegration, derives spread \
                  z-score signals, groups them into chains, validates their \
                  predictive power and backtests the down-chain strategy on a \
                  held-out window."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log stage diagnostics to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline (cointegration, signals, validation, backtest)
    Analyze(PairArgs),
    /// Engle-Granger cointegration test and hedge ratio
    Cointegration(PairArgs),
    /// Spread z-score, raw signals and chains
    Signals(PairArgs),
    /// Validate signal quality on the in-sample window
    Validate(PairArgs),
    /// Backtest the down-chain strategy on the held-out window
    Backtest(PairArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Analyze(args) => commands::pairs::run_analyze(args),
        Commands::Cointegration(args) => commands::pairs::run_cointegration(args),
        Commands::Signals(args) => commands::pairs::run_signals(args),
        Commands::Validate(args) => commands::evaluation::run_validate(args),
        Commands::Backtest(args) => commands::evaluation::run_backtest(args),
        Commands::Version => {
            println!("pairsig {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
