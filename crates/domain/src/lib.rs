//! # Faultline Domain
//!
//! Business domain types for the Faultline error-reporting adapter.
//!
//! This crate contains:
//! - Service identities, error descriptors and capture options
//! - Execution mode, deployment tier and host class flags
//! - DSN parsing and background-job context types
//! - Settings structures, domain constants and the domain error type
//!
//! ## Architecture
//! - No dependencies on other Faultline crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
