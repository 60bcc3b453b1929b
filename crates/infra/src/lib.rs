//! # Faultline Infrastructure
//!
//! Adapters for the ports defined in `faultline-core`.
//!
//! This crate contains:
//! - The Sentry-backed backend client and factory
//! - Settings loading from the environment and TOML/JSON files
//! - Static and environment DSN lookups
//! - Tracing subscriber installation
//!
//! ## Architecture
//! - Implements traits defined in `faultline-core`
//! - Depends on `faultline-common`, `faultline-domain` and `faultline-core`
//! - Contains all "impure" code (network, environment, files)

pub mod backend;
pub mod config;
pub mod dsn;
pub mod errors;
pub mod observability;
pub mod setup;

// Re-export commonly used items
pub use backend::{SentryBackendFactory, SentryClient};
pub use dsn::{DsnLookupChain, EnvDsnLookup, StaticDsnLookup};
pub use errors::InfraError;
pub use observability::{init_logging, LogFormat};
pub use setup::{configure, configure_global_from_environment, configure_with_backend};
