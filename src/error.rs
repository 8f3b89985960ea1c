//! Error types for lmdesign.

use thiserror::Error;

/// Result type alias for lmdesign operations.
pub type Result<T> = std::result::Result<T, LinearModelError>;

/// Errors that can occur while building a design matrix or fitting a model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LinearModelError {
    /// Predictor, response or design vectors have inconsistent lengths.
    #[error("Dimension mismatch in {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },
    /// A categorical predictor cannot be encoded (e.g. a single observed level).
    #[error("Invalid factor '{name}': {reason}")]
    InvalidFactor { name: String, reason: String },
    /// Not enough observations to leave any residual degrees of freedom.
    #[error(
        "Underdetermined model: {observations} observations for {parameters} parameters (need more observations than parameters)"
    )]
    UnderdeterminedModel {
        observations: usize,
        parameters: usize,
    },
    /// The design matrix does not have full column rank.
    #[error("Collinear predictors: column '{column}' is a linear combination of earlier columns")]
    CollinearPredictors { column: String },
    /// Invalid input data.
    #[error("Invalid input data: {0}")]
    InvalidInput(String),
    /// Invalid configuration value.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    /// An IO error.
    #[error("IO error: {0}")]
    Io(String),
    /// A serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// An error occurred during plotting.
    #[error("Plotting error: {0}")]
    Plotting(String),
}

impl LinearModelError {
    pub(crate) fn dimension_mismatch(
        context: impl Into<String>,
        expected: usize,
        actual: usize,
    ) -> Self {
        LinearModelError::DimensionMismatch {
            context: context.into(),
            expected,
            actual,
        }
    }

    pub(crate) fn invalid_factor(name: impl Into<String>, reason: impl Into<String>) -> Self {
        LinearModelError::InvalidFactor {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for LinearModelError {
    fn from(err: serde_json::Error) -> Self {
        LinearModelError::Serialization(err.to_string())
    }
}
