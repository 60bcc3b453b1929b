//! Background job failure reporting

pub mod context_filter;
pub mod handler;

pub use context_filter::{extract, filter_reserved_keys, JobMetadata};
pub use handler::{JobErrorHandler, JobHooks, JobReport};
