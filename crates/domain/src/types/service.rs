//! Service identity

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_SERVICE_NAME;
use crate::errors::{FaultlineError, Result};

/// Logical name used to select a reporting client.
///
/// Names are canonicalised on construction (surrounding whitespace trimmed,
/// ASCII lower-cased) so `"Billing "` and `"billing"` are the same identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServiceName(String);

impl ServiceName {
    /// Canonicalise and validate a raw service name.
    ///
    /// # Errors
    /// Returns `FaultlineError::InvalidInput` for empty or whitespace-only
    /// names.
    pub fn new(raw: impl AsRef<str>) -> Result<Self> {
        let canonical = raw.as_ref().trim().to_ascii_lowercase();
        if canonical.is_empty() {
            return Err(FaultlineError::InvalidInput("service name must not be empty".into()));
        }
        Ok(Self(canonical))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ServiceName {
    fn default() -> Self {
        Self(DEFAULT_SERVICE_NAME.to_string())
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ServiceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for ServiceName {
    type Err = FaultlineError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for ServiceName {
    type Error = FaultlineError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<&str> for ServiceName {
    type Error = FaultlineError;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ServiceName> for String {
    fn from(value: ServiceName) -> Self {
        value.0
    }
}
