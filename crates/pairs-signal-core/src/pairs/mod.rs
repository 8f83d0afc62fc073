pub mod analyzer;
#[cfg(feature = "backtest")]
pub mod backtest;
pub mod chains;
pub mod cointegration;
pub mod config;
pub mod signals;
#[cfg(feature = "validation")]
pub mod validation;
pub mod zscore;
