//! Error handler for failed background jobs
//!
//! Register [`JobErrorHandler::call`] with the job framework's error hooks.
//! It reports the failure through the reporting context with the job's
//! transaction name, its filtered context and ownership extras, then bumps
//! the retry metric.

use std::fmt;
use std::sync::Arc;

use faultline_domain::constants::{
    EXTRA_CODE_OWNER, EXTRA_SHARD, JOB_CONTEXT_KEY, JOB_CORRUPTION_TRANSACTION,
    UNKNOWN_CODE_OWNER,
};
use faultline_domain::{
    CaptureOptions, CaptureOutcome, ErrorDescriptor, ExecutionMode, JobClass, JobContext,
    JobSettings,
};
use serde_json::Value;
use tracing::{debug, warn};

use super::context_filter;
use crate::adapter::ReportingContext;

pub type JobClassHook = Arc<dyn Fn() -> Option<JobClass> + Send + Sync>;
pub type ShardIndexHook = Arc<dyn Fn() -> Option<i64> + Send + Sync>;
pub type CodeOwnerHook = Arc<dyn Fn(Option<&JobClass>) -> String + Send + Sync>;
pub type RetryMetricHook = Arc<dyn Fn(bool, &ErrorDescriptor) + Send + Sync>;

/// Host-supplied collaborators; every hook is optional.
#[derive(Clone, Default)]
pub struct JobHooks {
    job_class: Option<JobClassHook>,
    shard_index: Option<ShardIndexHook>,
    code_owner_for: Option<CodeOwnerHook>,
    increment_retry_metric: Option<RetryMetricHook>,
}

impl JobHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Class of the job currently failing
    pub fn with_job_class<F>(mut self, f: F) -> Self
    where
        F: Fn() -> Option<JobClass> + Send + Sync + 'static,
    {
        self.job_class = Some(Arc::new(f));
        self
    }

    pub fn with_shard_index<F>(mut self, f: F) -> Self
    where
        F: Fn() -> Option<i64> + Send + Sync + 'static,
    {
        self.shard_index = Some(Arc::new(f));
        self
    }

    pub fn with_code_owner<F>(mut self, f: F) -> Self
    where
        F: Fn(Option<&JobClass>) -> String + Send + Sync + 'static,
    {
        self.code_owner_for = Some(Arc::new(f));
        self
    }

    /// Called after every reported failure with whether ownership data was
    /// included
    pub fn with_retry_metric<F>(mut self, f: F) -> Self
    where
        F: Fn(bool, &ErrorDescriptor) + Send + Sync + 'static,
    {
        self.increment_retry_metric = Some(Arc::new(f));
        self
    }

    fn job_class(&self) -> Option<JobClass> {
        self.job_class.as_ref().and_then(|hook| hook())
    }

    fn shard_index(&self) -> Option<i64> {
        self.shard_index.as_ref().and_then(|hook| hook())
    }

    fn code_owner_for(&self, job_class: Option<&JobClass>) -> String {
        self.code_owner_for
            .as_ref()
            .map_or_else(|| UNKNOWN_CODE_OWNER.to_string(), |hook| hook(job_class))
    }

    fn increment_retry_metric(&self, include_ownership: bool, exception: &ErrorDescriptor) {
        if let Some(hook) = &self.increment_retry_metric {
            hook(include_ownership, exception);
        }
    }
}

impl fmt::Debug for JobHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobHooks")
            .field("job_class", &self.job_class.is_some())
            .field("shard_index", &self.shard_index.is_some())
            .field("code_owner_for", &self.code_owner_for.is_some())
            .field("increment_retry_metric", &self.increment_retry_metric.is_some())
            .finish()
    }
}

/// What the handler did with a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobReport {
    /// Reporting context not configured; nothing happened
    NotConfigured,
    /// Retries remain and reporting waits for the last one
    AwaitingRetries,
    /// Ran through the recorder
    Captured(CaptureOutcome),
    /// The capture failed and was logged
    Rescued,
}

/// Job framework error hook
#[derive(Debug)]
pub struct JobErrorHandler<'a> {
    context: &'a ReportingContext,
    hooks: JobHooks,
}

impl<'a> JobErrorHandler<'a> {
    pub fn new(context: &'a ReportingContext, hooks: JobHooks) -> Self {
        Self { context, hooks }
    }

    /// Report a failed job.
    pub fn call(&self, exception: &ErrorDescriptor, job: &JobContext) -> JobReport {
        let Some(settings) = self.context.settings() else {
            return JobReport::NotConfigured;
        };

        let mut options = CaptureOptions::new().with_hint("background", false);
        match context_filter::extract(job) {
            Ok(metadata) => {
                options.transaction = Some(metadata.transaction);
                options.contexts.insert(JOB_CONTEXT_KEY.to_string(), metadata.filtered_context);
            }
            Err(err) => {
                warn!(error = %err, "Could not extract job metadata");
                options.transaction = Some(JOB_CORRUPTION_TRANSACTION.to_string());
            }
        }

        if retries_remaining(&settings.jobs, job) {
            debug!(retry_count = ?job.retry_count(), "Job will be retried, not reporting yet");
            return JobReport::AwaitingRetries;
        }

        let include_ownership = settings.execution_mode != ExecutionMode::Test;
        let job_class = self.hooks.job_class();

        options.set_extra(EXTRA_SHARD, self.hooks.shard_index().map_or(Value::Null, Value::from));
        if include_ownership {
            options.set_extra(EXTRA_CODE_OWNER, self.hooks.code_owner_for(job_class.as_ref()));
        }

        let service = job_class.as_ref().and_then(|class| class.service_name.as_ref());
        let outcome = self.context.with_rescued_exceptions(service, |recorder| {
            recorder.capture_exception(exception.clone(), options)
        });

        self.hooks.increment_retry_metric(include_ownership, exception);

        outcome.map_or(JobReport::Rescued, JobReport::Captured)
    }
}

/// True when reporting is deferred to the last retry and this is not it
fn retries_remaining(settings: &JobSettings, job: &JobContext) -> bool {
    let retry = job.retry_setting();
    if !settings.report_after_job_retries || !retry.is_retryable() {
        return false;
    }
    let limit = i64::from(retry.limit(settings.default_max_retries));
    job.retry_count().map_or(true, |count| count < limit - 1)
}
