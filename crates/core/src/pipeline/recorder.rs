//! Recorder - runs the capture pipeline against one resolved client
//!
//! Exception pipeline, in order:
//! 1. interactive session gate
//! 2. unconfigured client gate
//! 3. retry classification
//! 4. copy-on-write of the caller's options
//! 5. transformers
//! 6. extras to tags enrichment
//! 7. suppressors
//! 8. dispatch
//!
//! Messages skip steps 3 and 7.

use std::backtrace::Backtrace;
use std::panic::Location;
use std::sync::Arc;

use faultline_domain::{
    AdapterSettings, CaptureOptions, CaptureOutcome, DeploymentTier, ErrorDescriptor, EventId,
    ExecutionMode, HostClass, IntoCaptureOptions, ServiceName, SkipReason,
};
use tracing::{debug, info};

use super::enrichment::enrich_extras_to_tags;
use super::registry::{FilterChain, SuppressorList, TransformerList};
use super::retry::is_retryable_storage_error;
use crate::client::BackendClient;
use crate::hub::ResolvedClient;

/// Process-level flags that decide whether anything is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Gating {
    pub mode: ExecutionMode,
    pub tier: DeploymentTier,
    pub host_class: HostClass,
}

impl Gating {
    pub fn from_settings(settings: &AdapterSettings) -> Self {
        Self { mode: settings.execution_mode, tier: settings.tier, host_class: settings.host_class }
    }

    /// Whether dropping an exception for lack of a DSN is worth a log line.
    /// Pseudo-production staging hosts and development stay quiet.
    pub fn logs_unconfigured_exception(&self) -> bool {
        match self.tier {
            DeploymentTier::Production => true,
            _ if self.mode == ExecutionMode::Test => true,
            DeploymentTier::Staging => self.host_class == HostClass::Standard,
            DeploymentTier::Development => false,
        }
    }
}

/// Per-call pipeline bound to one client.
pub struct Recorder {
    service: ServiceName,
    client: Arc<dyn BackendClient>,
    configured: bool,
    transformers: TransformerList,
    suppressors: SuppressorList,
    extras_to_tags: Arc<[String]>,
    gating: Gating,
}

impl Recorder {
    pub fn new(
        service: ServiceName,
        resolved: ResolvedClient,
        filters: &FilterChain,
        extras_to_tags: Arc<[String]>,
        gating: Gating,
    ) -> Self {
        Self {
            service,
            client: resolved.client,
            configured: resolved.configured,
            transformers: filters.transformers(),
            suppressors: filters.suppressors(),
            extras_to_tags,
            gating,
        }
    }

    pub fn service(&self) -> &ServiceName {
        &self.service
    }

    pub const fn is_configured(&self) -> bool {
        self.configured
    }

    pub fn client(&self) -> &Arc<dyn BackendClient> {
        &self.client
    }

    /// Run `exception` through the full pipeline.
    ///
    /// Policy skips come back as `Ok(CaptureOutcome::Skipped(..))`.
    ///
    /// # Errors
    /// Errors raised by a transformer, a suppressor or the client.
    pub fn capture_exception<'a>(
        &self,
        exception: ErrorDescriptor,
        options: impl IntoCaptureOptions<'a>,
    ) -> anyhow::Result<CaptureOutcome> {
        if self.gating.mode == ExecutionMode::Interactive {
            info!(
                service = %self.service,
                exception = %exception.inspect(),
                "Not reporting exception from interactive session"
            );
            return Ok(CaptureOutcome::Skipped(SkipReason::InteractiveSession));
        }

        if !self.configured {
            if self.gating.logs_unconfigured_exception() {
                info!(
                    service = %self.service,
                    exception = %exception.inspect(),
                    "Not reporting exception because DSN is not defined"
                );
            }
            return Ok(CaptureOutcome::Skipped(SkipReason::Unconfigured));
        }

        if is_retryable_storage_error(&exception) {
            debug!(
                service = %self.service,
                kind = %exception.kind,
                "Skipping retryable storage error"
            );
            return Ok(CaptureOutcome::Skipped(SkipReason::RetryableStorageError));
        }

        let options = options.into_capture_options().into_owned();
        let (exception, mut options) = self.apply_transformers(Some(exception), options)?;
        let Some(exception) = exception else {
            debug!(service = %self.service, "Transformer dropped exception");
            return Ok(CaptureOutcome::Skipped(SkipReason::Suppressed));
        };

        enrich_extras_to_tags(&mut options, &self.extras_to_tags);

        for suppressor in self.suppressors.iter() {
            if suppressor.suppress(&exception, &options)? {
                debug!(service = %self.service, kind = %exception.kind, "Exception suppressed");
                return Ok(CaptureOutcome::Skipped(SkipReason::Suppressed));
            }
        }

        let event_id = self.client.capture_exception(&exception, &options)?;
        Ok(CaptureOutcome::Dispatched(event_id))
    }

    /// Send a plain message. Suppressors and retry classification do not
    /// apply; with `use_backtrace` the current call stack is attached.
    ///
    /// # Errors
    /// Errors raised by a transformer or the client.
    #[track_caller]
    pub fn capture_message<'a>(
        &self,
        message: &str,
        options: impl IntoCaptureOptions<'a>,
        use_backtrace: bool,
    ) -> anyhow::Result<CaptureOutcome> {
        if self.gating.mode == ExecutionMode::Interactive {
            info!(
                service = %self.service,
                text = message,
                "Not reporting message from interactive session"
            );
            return Ok(CaptureOutcome::Skipped(SkipReason::InteractiveSession));
        }

        if !self.configured {
            info!(
                service = %self.service,
                text = message,
                "Not reporting message because DSN is not defined"
            );
            return Ok(CaptureOutcome::Skipped(SkipReason::Unconfigured));
        }

        let mut options = options.into_capture_options().into_owned();
        if use_backtrace {
            options.backtrace = Some(current_backtrace(Location::caller()));
        }

        let (_, mut options) = self.apply_transformers(None, options)?;
        enrich_extras_to_tags(&mut options, &self.extras_to_tags);

        let event_id = self.client.capture_message(message, &options)?;
        Ok(CaptureOutcome::Dispatched(event_id))
    }

    /// Straight passthrough to the client
    pub fn last_event_id(&self) -> Option<EventId> {
        self.client.last_event_id()
    }

    fn apply_transformers(
        &self,
        mut exception: Option<ErrorDescriptor>,
        mut options: CaptureOptions,
    ) -> anyhow::Result<(Option<ErrorDescriptor>, CaptureOptions)> {
        for transformer in self.transformers.iter() {
            (exception, options) =
                transformer.transform(exception, options, self.client.as_ref())?;
        }
        Ok((exception, options))
    }
}

/// Caller location first, then whatever frames the runtime can resolve
fn current_backtrace(caller: &Location<'_>) -> Vec<String> {
    let mut frames = vec![format!("{}:{}:{}", caller.file(), caller.line(), caller.column())];
    let trace = Backtrace::force_capture().to_string();
    frames.extend(trace.lines().map(str::trim).filter(|line| !line.is_empty()).map(String::from));
    frames
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_logging_policy() {
        let gating = |tier, mode, host_class| Gating { mode, tier, host_class };
        use DeploymentTier::{Development, Production, Staging};
        use ExecutionMode::{Normal, Test};
        use HostClass::{PseudoProduction, Standard};

        assert!(gating(Production, Normal, PseudoProduction).logs_unconfigured_exception());
        assert!(gating(Development, Test, Standard).logs_unconfigured_exception());
        assert!(gating(Staging, Normal, Standard).logs_unconfigured_exception());
        assert!(!gating(Staging, Normal, PseudoProduction).logs_unconfigured_exception());
        assert!(!gating(Development, Normal, Standard).logs_unconfigured_exception());
    }

    #[test]
    fn backtrace_starts_at_caller() {
        let frames = current_backtrace(Location::caller());
        assert!(!frames.is_empty());
        assert!(frames[0].contains("recorder.rs"));
    }
}
