//! Common error types shared by the utility modules.
//!
//! `CommonError` reports input the utilities refuse, such as an invalid
//! filter rule. Crates further up the stack convert it into their own error
//! enums rather than exposing it directly.
//!
//! ```rust
//! use faultline_common::error::{CommonError, CommonResult};
//!
//! fn parse_port(raw: &str) -> CommonResult<u16> {
//!     raw.parse().map_err(|_| CommonError::validation_with_value("port", "not a number", raw))
//! }
//!
//! assert!(parse_port("eighty").is_err());
//! ```

use std::fmt;

/// Standard result type using CommonError
pub type CommonResult<T> = Result<T, CommonError>;

/// Errors raised by the utility modules
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommonError {
    /// Rejected input, with the offending value when it is safe to echo
    Validation { field: String, message: String, value: Option<String> },
}

impl fmt::Display for CommonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation { field, message, value: Some(value) } => write!(
                f,
                "Validation error for field '{}' (value: '{}'): {}",
                field, value, message
            ),
            Self::Validation { field, message, value: None } => {
                write!(f, "Validation error for field '{}': {}", field, message)
            }
        }
    }
}

impl std::error::Error for CommonError {}

impl CommonError {
    /// Create a validation error
    pub fn validation<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self::Validation { field: field.into(), message: message.into(), value: None }
    }

    /// Create a validation error with the offending value
    pub fn validation_with_value<F: Into<String>, M: Into<String>, V: Into<String>>(
        field: F,
        message: M,
        value: V,
    ) -> Self {
        Self::Validation { field: field.into(), message: message.into(), value: Some(value.into()) }
    }
}

impl From<regex::Error> for CommonError {
    fn from(err: regex::Error) -> Self {
        Self::validation("filter_parameters", err.to_string())
    }
}
