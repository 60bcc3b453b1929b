//! Port interfaces for the error-tracking backend
//!
//! These traits define the boundary between the reporting core and the
//! concrete backend adapters in `faultline-infra`.

use std::fmt;
use std::sync::Arc;

use faultline_common::ParameterFilter;
use faultline_domain::{CaptureOptions, ErrorDescriptor, EventId, Result, Scope, ServiceName};
use serde_json::Value;

use super::config::ClientConfig;

/// A configured handle able to send events to the backend
pub trait BackendClient: Send + Sync {
    /// Send an exception; returns the id assigned to the event, if any
    fn capture_exception(
        &self,
        exception: &ErrorDescriptor,
        options: &CaptureOptions,
    ) -> Result<Option<EventId>>;

    /// Send a plain message
    fn capture_message(&self, message: &str, options: &CaptureOptions) -> Result<Option<EventId>>;

    /// Id of the last event this client recorded
    fn last_event_id(&self) -> Option<EventId>;

    /// Configuration the client was built from
    fn configuration(&self) -> &ClientConfig;
}

/// Builds backend clients from a resolved configuration
pub trait BackendFactory: Send + Sync {
    /// Create a client bound to `scope`
    fn create_client(&self, config: ClientConfig, scope: Scope) -> Result<Arc<dyn BackendClient>>;

    /// Error kinds the backend integration excludes out of the box
    fn default_excluded_errors(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Redaction step applied to the fully serialised event before it is sent
pub trait EventFilter: Send + Sync + fmt::Debug {
    fn filter_event(&self, event: Value) -> Value;
}

impl EventFilter for ParameterFilter {
    fn filter_event(&self, event: Value) -> Value {
        self.filter_value(event)
    }
}

/// Resolves the DSN configured for a service
pub trait DsnLookup: Send + Sync {
    fn lookup(&self, service: &ServiceName) -> Option<String>;
}

impl<F> DsnLookup for F
where
    F: Fn(&ServiceName) -> Option<String> + Send + Sync,
{
    fn lookup(&self, service: &ServiceName) -> Option<String> {
        self(service)
    }
}
