//! Background job metadata passed to the job error handler

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::ServiceName;

/// Job class as reported by the host framework, with the service that owns it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobClass {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_name: Option<ServiceName>,
}

impl JobClass {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), service_name: None }
    }

    pub fn with_service(mut self, service: ServiceName) -> Self {
        self.service_name = Some(service);
        self
    }
}

/// Retry policy read from the job payload's `retry` field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrySetting {
    Disabled,
    /// `retry: true`; the framework's default limit applies
    Default,
    Limit(u32),
}

impl RetrySetting {
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Bool(true)) => Self::Default,
            Some(Value::Number(n)) => match n.as_u64() {
                Some(0) | None => Self::Disabled,
                Some(limit) => Self::Limit(u32::try_from(limit).unwrap_or(u32::MAX)),
            },
            _ => Self::Disabled,
        }
    }

    pub const fn is_retryable(&self) -> bool {
        !matches!(self, Self::Disabled)
    }

    pub const fn limit(&self, default_max: u32) -> u32 {
        match self {
            Self::Disabled => 0,
            Self::Default => default_max,
            Self::Limit(limit) => *limit,
        }
    }
}

/// Raw context handed over by the job framework on failure.
///
/// Holds the untouched JSON payload; the job itself lives under `job`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobContext(pub Value);

impl JobContext {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn job(&self) -> Option<&Map<String, Value>> {
        self.0.get("job").and_then(Value::as_object)
    }

    /// Wrapped class name if present, otherwise the job class
    pub fn job_class_name(&self) -> Option<&str> {
        let job = self.job()?;
        job.get("wrapped")
            .and_then(Value::as_str)
            .or_else(|| job.get("class").and_then(Value::as_str))
            .filter(|name| !name.is_empty())
    }

    pub fn retry_setting(&self) -> RetrySetting {
        RetrySetting::from_value(self.job().and_then(|job| job.get("retry")))
    }

    pub fn retry_count(&self) -> Option<i64> {
        self.job().and_then(|job| job.get("retry_count")).and_then(Value::as_i64)
    }
}

impl From<Value> for JobContext {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
