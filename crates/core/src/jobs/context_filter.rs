//! Extracts reportable metadata from a failed job's context

use faultline_domain::constants::{JOB_RESERVED_KEY_PREFIX, JOB_TRANSACTION_PREFIX};
use faultline_domain::{FaultlineError, JobContext, Result};
use serde_json::{Map, Value};

/// Transaction name and sanitised context for one failed job
#[derive(Debug, Clone, PartialEq)]
pub struct JobMetadata {
    pub transaction: String,
    pub filtered_context: Value,
}

/// Extract the transaction name and the filtered context.
///
/// # Errors
/// `FaultlineError::InvalidInput` when the context has no `job` object or the
/// job has no class.
pub fn extract(context: &JobContext) -> Result<JobMetadata> {
    if context.job().is_none() {
        return Err(FaultlineError::InvalidInput("job context has no job payload".into()));
    }
    let class = context
        .job_class_name()
        .ok_or_else(|| FaultlineError::InvalidInput("job payload has no class".into()))?;

    Ok(JobMetadata {
        transaction: format!("{JOB_TRANSACTION_PREFIX}{class}"),
        filtered_context: filter_reserved_keys(context.as_value()),
    })
}

/// Copy of `value` without framework-internal keys, at any depth
pub fn filter_reserved_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(key, _)| !key.starts_with(JOB_RESERVED_KEY_PREFIX))
                .map(|(key, nested)| (key.clone(), filter_reserved_keys(nested)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(filter_reserved_keys).collect()),
        other => other.clone(),
    }
}
