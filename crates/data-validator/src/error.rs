//! Validation Error Types

use thiserror::Error;

/// Errors during payload validation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Field present but not usable as a number
    #[error("Invalid value for field '{field}': {reason}")]
    InvalidField {
        field: &'static str,
        reason: String,
    },

    /// Invalid payload format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// Missing required field
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

impl ValidationError {
    /// Name of the offending field, if the error concerns one
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ValidationError::InvalidField { field, .. } => Some(field),
            ValidationError::MissingField(field) => Some(field),
            ValidationError::InvalidFormat(_) => None,
        }
    }
}
