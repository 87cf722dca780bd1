//! Error types shared by ragadmin crates

use thiserror::Error;

/// Result type alias for shared operations
pub type Result<T> = std::result::Result<T, CommonError>;

/// Errors raised by shared helpers (field validation, date parsing)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommonError {
    /// A form field failed a client-side check
    #[error("{field}: {message}")]
    InvalidField { field: &'static str, message: String },

    #[error("Invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),
}

impl CommonError {
    /// Create an invalid field error
    pub fn invalid_field(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            message: message.into(),
        }
    }

    /// Name of the offending field, if any
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::InvalidField { field, .. } => Some(field),
            Self::InvalidDate(_) => None,
        }
    }
}
