//! Testing utilities and helpers
//!
//! - **[`logs`]**: capture `tracing` events emitted by code under test
//!
//! ## Usage
//!
//! ```rust
//! use faultline_common::testing::LogCapture;
//!
//! let capture = LogCapture::new();
//! capture.in_scope(|| tracing::error!(service = "billing", "dispatch failed"));
//!
//! assert_eq!(capture.count_at(tracing::Level::ERROR), 1);
//! assert!(capture.contains("dispatch failed"));
//! ```

pub mod logs;

pub use logs::{CapturedLog, LogCapture};
