//! In-memory backend for tests
//!
//! [`RecordingBackendFactory`] builds [`RecordingClient`]s that keep every
//! dispatched event in a buffer shared with the factory, so a test can
//! configure a [`ReportingContext`](crate::ReportingContext) and then assert
//! on what reached the backend.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use faultline_domain::{
    CaptureOptions, ErrorDescriptor, EventId, FaultlineError, Result, Scope, ServiceName,
};
use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::client::{BackendClient, BackendFactory, ClientConfig};

/// What was sent
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedPayload {
    Exception(ErrorDescriptor),
    Message(String),
}

/// One event as the backend would have received it
#[derive(Debug, Clone)]
pub struct RecordedEvent {
    pub service: ServiceName,
    pub event_id: EventId,
    pub payload: RecordedPayload,
    pub options: CaptureOptions,
    pub scope: Scope,
    /// Serialised event after the client's event filter ran
    pub sent: Value,
}

impl RecordedEvent {
    pub fn exception(&self) -> Option<&ErrorDescriptor> {
        match &self.payload {
            RecordedPayload::Exception(e) => Some(e),
            RecordedPayload::Message(_) => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match &self.payload {
            RecordedPayload::Message(m) => Some(m),
            RecordedPayload::Exception(_) => None,
        }
    }
}

type EventLog = Arc<Mutex<Vec<RecordedEvent>>>;

/// Factory whose clients record instead of sending
#[derive(Clone, Default)]
pub struct RecordingBackendFactory {
    events: EventLog,
    built: Arc<Mutex<Vec<ServiceName>>>,
    created: Arc<AtomicUsize>,
    default_exclusions: Vec<String>,
    failing_services: BTreeSet<ServiceName>,
    build_delay: Option<Duration>,
}

impl RecordingBackendFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exclusions reported through `default_excluded_errors`
    pub fn with_default_exclusions<I, S>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_exclusions = kinds.into_iter().map(Into::into).collect();
        self
    }

    /// Make `create_client` fail for `service`
    pub fn with_failing_service(mut self, service: ServiceName) -> Self {
        self.failing_services.insert(service);
        self
    }

    /// Sleep inside `create_client`, widening race windows in concurrency
    /// tests
    pub fn with_build_delay(mut self, delay: Duration) -> Self {
        self.build_delay = Some(delay);
        self
    }

    /// Number of clients built so far
    pub fn clients_created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Services clients were built for, in build order
    pub fn built_services(&self) -> Vec<ServiceName> {
        self.built.lock().clone()
    }

    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().clone()
    }

    pub fn event_count(&self) -> usize {
        self.events.lock().len()
    }

    pub fn clear_events(&self) {
        self.events.lock().clear();
    }
}

impl BackendFactory for RecordingBackendFactory {
    fn create_client(&self, config: ClientConfig, scope: Scope) -> Result<Arc<dyn BackendClient>> {
        if let Some(delay) = self.build_delay {
            thread::sleep(delay);
        }
        if self.failing_services.contains(config.service()) {
            return Err(FaultlineError::Backend(format!(
                "refusing to build client for '{}'",
                config.service()
            )));
        }

        self.created.fetch_add(1, Ordering::SeqCst);
        self.built.lock().push(config.service().clone());
        Ok(Arc::new(RecordingClient {
            config,
            scope,
            events: Arc::clone(&self.events),
            last_event_id: Mutex::new(None),
        }))
    }

    fn default_excluded_errors(&self) -> Vec<String> {
        self.default_exclusions.clone()
    }
}

/// Client that appends to the shared event log
pub struct RecordingClient {
    config: ClientConfig,
    scope: Scope,
    events: EventLog,
    last_event_id: Mutex<Option<EventId>>,
}

impl RecordingClient {
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    fn record(&self, payload: RecordedPayload, options: &CaptureOptions) -> EventId {
        let event_id = EventId::new_v4();
        let body = match &payload {
            RecordedPayload::Exception(e) => json!({ "exception": e }),
            RecordedPayload::Message(m) => json!({ "message": m }),
        };
        let mut event = serde_json::to_value(options).unwrap_or(Value::Null);
        if let (Value::Object(event), Value::Object(body)) = (&mut event, body) {
            event.extend(body);
        }

        self.events.lock().push(RecordedEvent {
            service: self.config.service().clone(),
            event_id,
            payload,
            options: options.clone(),
            scope: self.scope.clone(),
            sent: self.config.filter_event(event),
        });
        *self.last_event_id.lock() = Some(event_id);
        event_id
    }
}

impl BackendClient for RecordingClient {
    fn capture_exception(
        &self,
        exception: &ErrorDescriptor,
        options: &CaptureOptions,
    ) -> Result<Option<EventId>> {
        if self.config.is_excluded(&exception.kind) {
            return Ok(None);
        }
        Ok(Some(self.record(RecordedPayload::Exception(exception.clone()), options)))
    }

    fn capture_message(&self, message: &str, options: &CaptureOptions) -> Result<Option<EventId>> {
        Ok(Some(self.record(RecordedPayload::Message(message.to_string()), options)))
    }

    fn last_event_id(&self) -> Option<EventId> {
        *self.last_event_id.lock()
    }

    fn configuration(&self) -> &ClientConfig {
        &self.config
    }
}
