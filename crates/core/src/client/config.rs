//! Per-service client configuration

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use faultline_domain::constants::{
    DSN_INVALID_ERROR, ENABLED_ENVIRONMENTS, ENVIRONMENT_DISABLED_ERROR_PREFIX,
};
use faultline_domain::{Dsn, ServiceName};
use serde_json::Value;

use super::ports::EventFilter;

/// Inputs for [`ClientConfig::new`]
#[derive(Debug, Clone, Default)]
pub struct ClientConfigParams {
    pub service: ServiceName,
    pub dsn: Option<String>,
    pub environment: String,
    pub release: Option<String>,
    pub excluded_errors: BTreeSet<String>,
    pub event_filter: Option<Arc<dyn EventFilter>>,
}

/// Immutable configuration for one backend client.
///
/// Validation runs once at construction; problems are recorded in
/// [`errors`](Self::errors) rather than returned, so a degraded client can
/// still be built and inspected.
#[derive(Clone)]
pub struct ClientConfig {
    service: ServiceName,
    raw_dsn: Option<String>,
    dsn: Option<Dsn>,
    environment: String,
    release: Option<String>,
    enabled_environments: BTreeSet<String>,
    excluded_errors: BTreeSet<String>,
    event_filter: Option<Arc<dyn EventFilter>>,
    send_default_pii: bool,
    background_worker_threads: usize,
    auto_session_tracking: bool,
    errors: Vec<String>,
}

impl ClientConfig {
    pub fn new(params: ClientConfigParams) -> Self {
        let dsn = params.dsn.as_deref().and_then(|raw| Dsn::parse(raw).ok());
        let enabled_environments: BTreeSet<String> =
            ENABLED_ENVIRONMENTS.iter().map(ToString::to_string).collect();

        let mut errors = Vec::new();
        if dsn.is_none() {
            errors.push(DSN_INVALID_ERROR.to_string());
        }
        if !enabled_environments.contains(&params.environment) {
            errors.push(format!(
                "{ENVIRONMENT_DISABLED_ERROR_PREFIX} '{}'",
                params.environment
            ));
        }

        Self {
            service: params.service,
            raw_dsn: params.dsn,
            dsn,
            environment: params.environment,
            release: params.release,
            enabled_environments,
            excluded_errors: params.excluded_errors,
            event_filter: params.event_filter,
            send_default_pii: true,
            background_worker_threads: 0,
            auto_session_tracking: false,
            errors,
        }
    }

    pub fn service(&self) -> &ServiceName {
        &self.service
    }

    /// Parsed DSN; `None` when missing or invalid
    pub fn dsn(&self) -> Option<&Dsn> {
        self.dsn.as_ref()
    }

    /// DSN exactly as the lookup returned it
    pub fn raw_dsn(&self) -> Option<&str> {
        self.raw_dsn.as_deref()
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn release(&self) -> Option<&str> {
        self.release.as_deref()
    }

    pub fn enabled_environments(&self) -> &BTreeSet<String> {
        &self.enabled_environments
    }

    pub fn excluded_errors(&self) -> &BTreeSet<String> {
        &self.excluded_errors
    }

    pub fn is_excluded(&self, kind: &str) -> bool {
        self.excluded_errors.contains(kind)
    }

    pub fn event_filter(&self) -> Option<&Arc<dyn EventFilter>> {
        self.event_filter.as_ref()
    }

    /// Run the configured redaction step, if any, over a serialised event
    pub fn filter_event(&self, event: Value) -> Value {
        match &self.event_filter {
            Some(filter) => filter.filter_event(event),
            None => event,
        }
    }

    pub const fn send_default_pii(&self) -> bool {
        self.send_default_pii
    }

    /// Always zero: events are sent on the caller's thread
    pub const fn background_worker_threads(&self) -> usize {
        self.background_worker_threads
    }

    pub const fn auto_session_tracking(&self) -> bool {
        self.auto_session_tracking
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn has_dsn_error(&self) -> bool {
        self.errors.iter().any(|e| e == DSN_INVALID_ERROR)
    }

    pub fn sending_allowed(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("service", &self.service)
            .field("dsn", &self.dsn.as_ref().map(Dsn::host))
            .field("environment", &self.environment)
            .field("release", &self.release)
            .field("excluded_errors", &self.excluded_errors)
            .field("event_filter", &self.event_filter.is_some())
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}
