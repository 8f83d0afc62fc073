pub mod error;
pub mod pairs;
pub mod stats;
pub mod types;

pub use error::PairsError;
pub use types::*;

/// Standard result type for all pairs-signal operations
pub type PairsResult<T> = Result<T, PairsError>;
