//! Shared test helpers for `faultline-core` integration tests.
//!
//! Settings fixtures, a table-backed DSN lookup and a helper that wires a
//! [`ReportingContext`] to the in-memory recording backend.

#![allow(dead_code)]

pub mod fixtures;

pub use fixtures::*;
