//! Error types for the price core

use thiserror::Error;

/// Errors raised while building or validating core artifacts
#[derive(Error, Debug)]
pub enum CoreError {
    /// Feature matrix and target vector disagree in length
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// A model or preprocessor failed structural validation
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// Canonical serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors surfaced by the inference boundary.
///
/// Anything other than an unseen category is folded into
/// [`InferenceError::PredictionFailed`] so callers only ever branch on two
/// outcomes.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InferenceError {
    /// A categorical value was not present when the encoders were fitted
    #[error("Unseen {field} value: {value:?}")]
    UnseenCategory { field: String, value: String },

    /// Any other failure while preparing or scoring the row
    #[error("Prediction failed: {0}")]
    PredictionFailed(String),
}
