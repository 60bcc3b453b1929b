//! Conversions from external infrastructure errors into domain errors.

use std::io::{Error as IoError, ErrorKind};

use faultline_domain::FaultlineError;
use sentry::types::ParseDsnError;
use serde_json::Error as JsonError;
use toml::de::Error as TomlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub FaultlineError);

impl From<InfraError> for FaultlineError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<FaultlineError> for InfraError {
    fn from(value: FaultlineError) -> Self {
        Self(value)
    }
}

/// Makes the mapping usable with `map_err` where `?` cannot convert.
pub trait IntoFaultlineError {
    fn into_faultline(self) -> FaultlineError;
}

/* -------------------------------------------------------------------------- */
/* std::io::Error → FaultlineError */
/* -------------------------------------------------------------------------- */

impl IntoFaultlineError for IoError {
    fn into_faultline(self) -> FaultlineError {
        match self.kind() {
            ErrorKind::NotFound => FaultlineError::Config(format!("file not found: {self}")),
            ErrorKind::PermissionDenied => {
                FaultlineError::Config(format!("permission denied: {self}"))
            }
            _ => FaultlineError::Internal(format!("i/o failure: {self}")),
        }
    }
}

impl From<IoError> for InfraError {
    fn from(value: IoError) -> Self {
        Self(value.into_faultline())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error → FaultlineError */
/* -------------------------------------------------------------------------- */

impl IntoFaultlineError for JsonError {
    fn into_faultline(self) -> FaultlineError {
        if self.is_io() {
            return FaultlineError::Internal(format!("i/o failure reading JSON: {self}"));
        }
        FaultlineError::Config(format!("Invalid JSON format: {self}"))
    }
}

impl From<JsonError> for InfraError {
    fn from(value: JsonError) -> Self {
        Self(value.into_faultline())
    }
}

/* -------------------------------------------------------------------------- */
/* toml::de::Error → FaultlineError */
/* -------------------------------------------------------------------------- */

impl IntoFaultlineError for TomlError {
    fn into_faultline(self) -> FaultlineError {
        FaultlineError::Config(format!("Invalid TOML format: {}", self.message()))
    }
}

impl From<TomlError> for InfraError {
    fn from(value: TomlError) -> Self {
        Self(value.into_faultline())
    }
}

/* -------------------------------------------------------------------------- */
/* sentry::types::ParseDsnError → FaultlineError */
/* -------------------------------------------------------------------------- */

impl IntoFaultlineError for ParseDsnError {
    fn into_faultline(self) -> FaultlineError {
        FaultlineError::Backend(format!("backend rejected DSN: {self}"))
    }
}

impl From<ParseDsnError> for InfraError {
    fn from(value: ParseDsnError) -> Self {
        Self(value.into_faultline())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
