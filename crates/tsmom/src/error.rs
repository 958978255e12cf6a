//! Error types for the momentum pipeline.

use thiserror::Error;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, TsmomError>;

/// Errors that can occur while running the pipeline.
///
/// Cells that cannot be computed yet (the first return, rows inside a
/// lookback window) are not errors: they flow forward as nulls.
#[derive(Debug, Error)]
pub enum TsmomError {
    /// Malformed or insufficient input data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Parameter outside its valid range for the given data
    #[error("Invalid parameter {name}={value}: {reason}")]
    InvalidParameter {
        /// Parameter name
        name: &'static str,
        /// Offending value
        value: String,
        /// Why the value was rejected
        reason: String,
    },

    /// Missing required column in input data
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// Polars DataFrame error
    #[error("DataFrame error: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

impl TsmomError {
    /// Build an [`TsmomError::InvalidParameter`] from any displayable value.
    pub fn invalid_parameter(
        name: &'static str,
        value: impl std::fmt::Display,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            name,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}
