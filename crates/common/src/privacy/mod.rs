//! Privacy Module - Portable Core
//!
//! Redaction of sensitive values inside structured (JSON) payloads before
//! they leave the process.

pub mod parameter_filter;

// Re-export commonly used types
pub use parameter_filter::{ParameterFilter, FILTERED_MASK};
