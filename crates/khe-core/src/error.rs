//! Error types for KHE

use thiserror::Error;

/// Main error type for KHE operations
#[derive(Debug, Error)]
pub enum KheError {
    /// Error in the instance or solution model
    #[error("Model error: {0}")]
    Model(String),

    /// Invalid operation for the current solution state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A textual value could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Internal error (should not occur in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<crate::cost::CostParseError> for KheError {
    fn from(e: crate::cost::CostParseError) -> Self {
        KheError::Parse(e.to_string())
    }
}

impl From<crate::partition::PartitionParseError> for KheError {
    fn from(e: crate::partition::PartitionParseError) -> Self {
        KheError::Parse(e.to_string())
    }
}

/// Result type alias for KHE operations
pub type Result<T> = std::result::Result<T, KheError>;
