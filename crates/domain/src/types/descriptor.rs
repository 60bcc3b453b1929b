//! Structured description of a captured error
//!
//! Decouples reporting from any particular error hierarchy: callers describe
//! the error's kind, message and where it came from, and policy (retry
//! classification, exclusion lists) works on that description alone.

use std::error::Error as StdError;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Which layer raised the error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorOrigin {
    #[default]
    Application,
    /// Raised by the storage driver
    Storage(StorageOperation),
}

/// Shape of the storage operation that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageOperation {
    #[default]
    Single,
    /// Bulk write; per-item results are carried in `nested_messages`
    BulkWrite,
}

/// An error as seen by the reporting pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDescriptor {
    /// Fully-qualified kind, e.g. `Mongo::Error::OperationFailure`
    pub kind: String,
    pub message: String,
    #[serde(default)]
    pub origin: ErrorOrigin,
    /// Embedded result descriptions (bulk write results, error sources)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nested_messages: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub backtrace: Vec<String>,
}

impl ErrorDescriptor {
    /// Application-level error
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            origin: ErrorOrigin::Application,
            nested_messages: Vec::new(),
            backtrace: Vec::new(),
        }
    }

    /// Single-operation failure raised by the storage driver
    pub fn storage(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            origin: ErrorOrigin::Storage(StorageOperation::Single),
            ..Self::new(kind, message)
        }
    }

    /// Bulk-write failure with its per-item result descriptions
    pub fn bulk_write<I, S>(kind: impl Into<String>, message: impl Into<String>, results: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            origin: ErrorOrigin::Storage(StorageOperation::BulkWrite),
            nested_messages: results.into_iter().map(Into::into).collect(),
            ..Self::new(kind, message)
        }
    }

    /// Describe a Rust error; the source chain becomes `nested_messages`.
    pub fn from_error<E>(err: &E) -> Self
    where
        E: StdError + ?Sized,
    {
        let kind = std::any::type_name::<E>();
        let mut descriptor = Self::new(kind, err.to_string());
        let mut source = err.source();
        while let Some(cause) = source {
            descriptor.nested_messages.push(cause.to_string());
            source = cause.source();
        }
        descriptor
    }

    pub fn with_nested_message(mut self, message: impl Into<String>) -> Self {
        self.nested_messages.push(message.into());
        self
    }

    pub fn with_backtrace<I, S>(mut self, frames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.backtrace = frames.into_iter().map(Into::into).collect();
        self
    }

    pub const fn is_storage(&self) -> bool {
        matches!(self.origin, ErrorOrigin::Storage(_))
    }

    pub const fn is_bulk_write(&self) -> bool {
        matches!(self.origin, ErrorOrigin::Storage(StorageOperation::BulkWrite))
    }

    /// Inspect-style rendering: `#<Kind: message>`
    pub fn inspect(&self) -> String {
        format!("#<{}: {}>", self.kind, self.message)
    }
}

impl fmt::Display for ErrorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}
