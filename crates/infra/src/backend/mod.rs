//! Sentry-backed implementation of the backend ports
//!
//! [`SentryBackendFactory`] turns a resolved [`ClientConfig`] into a
//! `sentry::Client` bound to its own `sentry::Hub`, so every service keeps
//! its DSN and scope apart from the process-wide hub.
//!
//! [`ClientConfig`]: faultline_core::ClientConfig

pub mod client;
pub mod event;
pub mod factory;

pub use client::SentryClient;
pub use factory::{SentryBackendFactory, DEFAULT_EXCLUDED_ERRORS, DEFAULT_FLUSH_TIMEOUT};
