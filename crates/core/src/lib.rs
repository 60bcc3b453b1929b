//! # Faultline Core
//!
//! Reporting logic - no backend or platform code.
//!
//! This crate contains:
//! - Port interfaces for backend clients, DSN lookup and event filtering
//! - The client factory and the per-service hub cache
//! - The capture pipeline: filter chain, retry classifier, extras to tags
//!   enrichment and the recorder
//! - The reporting context and the background job error handler
//!
//! ## Architecture Principles
//! - Only depends on `faultline-common` and `faultline-domain`
//! - No network or SDK code; backends plug in through [`BackendFactory`]
//! - Reporting never fails the caller: see
//!   [`ReportingContext::with_rescued_exceptions`]

pub mod adapter;
pub mod client;
pub mod hub;
pub mod jobs;
pub mod pipeline;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use adapter::{AdapterOptions, ReportingContext};
pub use client::{
    BackendClient, BackendFactory, ClientConfig, ClientConfigParams, ClientFactory, DsnLookup,
    EventFilter,
};
pub use hub::{HubCache, ResolvedClient};
pub use jobs::{JobErrorHandler, JobHooks, JobReport};
pub use pipeline::{
    suppressor_fn, transformer_fn, ExceptionSuppressor, FilterChain, Gating, Recorder,
    Transformed, Transformer,
};
