//! Payload validation errors.

use thiserror::Error;

/// Reasons a payload is rejected before delivery.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The payload has no `result` object.
    #[error("field 'result' is required")]
    MissingResult,

    /// The `result` object has an empty outcome.
    #[error("field 'result.outcome' is required")]
    MissingOutcome,

    /// The outcome is not one of success, failure, partial.
    #[error("invalid result.outcome: {0}")]
    InvalidOutcome(String),

    /// A category was given without a subcategory.
    #[error("field 'subcategory' is required when 'category' is set")]
    MissingSubcategory,
}

/// Result type alias using ValidationError.
pub type ValidationResult<T> = Result<T, ValidationError>;
