//! Backend client over one `sentry::Hub`

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use faultline_core::{BackendClient, ClientConfig};
use faultline_domain::{CaptureOptions, ErrorDescriptor, EventId, Result};
use sentry::protocol::Event;
use sentry::{Client, Hub};
use tracing::debug;

use super::event::{exception_event, message_event};

/// Sends events synchronously through a dedicated hub.
///
/// Every capture is followed by a flush bounded by the configured timeout,
/// so an event has left the process (or been given up on) when the call
/// returns.
pub struct SentryClient {
    config: ClientConfig,
    client: Arc<Client>,
    hub: Arc<Hub>,
    flush_timeout: Duration,
}

impl SentryClient {
    pub fn new(
        config: ClientConfig,
        client: Arc<Client>,
        hub: Arc<Hub>,
        flush_timeout: Duration,
    ) -> Self {
        Self { config, client, hub, flush_timeout }
    }

    pub fn hub(&self) -> &Arc<Hub> {
        &self.hub
    }

    fn send(&self, event: Event<'static>) -> Option<EventId> {
        let event_id = self.hub.capture_event(event);
        if !self.client.flush(Some(self.flush_timeout)) {
            debug!(service = %self.config.service(), "Flush timed out");
        }
        (!event_id.is_nil()).then_some(event_id)
    }

    fn sending_allowed(&self) -> bool {
        if self.config.sending_allowed() {
            return true;
        }
        debug!(
            service = %self.config.service(),
            errors = ?self.config.errors(),
            "Client not allowed to send"
        );
        false
    }
}

impl BackendClient for SentryClient {
    fn capture_exception(
        &self,
        exception: &ErrorDescriptor,
        options: &CaptureOptions,
    ) -> Result<Option<EventId>> {
        if !self.sending_allowed() {
            return Ok(None);
        }
        if self.config.is_excluded(&exception.kind) {
            debug!(service = %self.config.service(), kind = %exception.kind, "Excluded error kind");
            return Ok(None);
        }
        Ok(self.send(exception_event(exception, options)))
    }

    fn capture_message(&self, message: &str, options: &CaptureOptions) -> Result<Option<EventId>> {
        if !self.sending_allowed() {
            return Ok(None);
        }
        Ok(self.send(message_event(message, options)))
    }

    fn last_event_id(&self) -> Option<EventId> {
        self.hub.last_event_id()
    }

    fn configuration(&self) -> &ClientConfig {
        &self.config
    }
}

impl fmt::Debug for SentryClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SentryClient")
            .field("service", self.config.service())
            .field("enabled", &self.client.is_enabled())
            .field("flush_timeout", &self.flush_timeout)
            .finish_non_exhaustive()
    }
}
