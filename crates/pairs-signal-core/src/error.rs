use thiserror::Error;

#[derive(Debug, Error)]
pub enum PairsError {
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Numerical error in {context}: {reason}")]
    NumericalError { context: String, reason: String },

    #[error("Configuration error: {field}: {reason}")]
    ConfigurationError { field: String, reason: String },

    #[error("Index alignment error: {0}")]
    IndexAlignmentError(String),

    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl PairsError {
    pub(crate) fn numerical(context: &str, reason: impl Into<String>) -> Self {
        PairsError::NumericalError {
            context: context.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn config(field: &str, reason: impl Into<String>) -> Self {
        PairsError::ConfigurationError {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for PairsError {
    fn from(e: serde_json::Error) -> Self {
        PairsError::SerializationError(e.to_string())
    }
}
