//! Builds [`SentryClient`]s from resolved client configurations

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use faultline_core::{BackendClient, BackendFactory, ClientConfig, EventFilter};
use faultline_domain::{Result, Scope};
use sentry::protocol::Event;
use sentry::transports::DefaultTransportFactory;
use sentry::{Client, ClientOptions, Hub, TransportFactory};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use super::client::SentryClient;
use crate::errors::IntoFaultlineError;

/// Upper bound on the flush after each capture
pub const DEFAULT_FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// Error kinds the integration ignores unless configured otherwise
pub const DEFAULT_EXCLUDED_ERRORS: [&str; 20] = [
    "AbstractController::ActionNotFound",
    "ActionController::BadRequest",
    "ActionController::InvalidAuthenticityToken",
    "ActionController::InvalidCrossOriginRequest",
    "ActionController::MethodNotAllowed",
    "ActionController::NotImplemented",
    "ActionController::ParameterMissing",
    "ActionController::RoutingError",
    "ActionController::UnknownAction",
    "ActionController::UnknownFormat",
    "ActionController::UnknownHttpMethod",
    "ActionDispatch::Http::MimeNegotiation::InvalidType",
    "ActionDispatch::Http::Parameters::ParseError",
    "ActiveJob::DeserializationError",
    "ActiveRecord::RecordNotFound",
    "CGI::Session::CookieStore::TamperedWithCookie",
    "Mongoid::Errors::DocumentNotFound",
    "Rack::QueryParser::InvalidParameterError",
    "Rack::QueryParser::ParameterTypeError",
    "Sinatra::NotFound",
];

/// [`BackendFactory`] producing one `sentry::Client` and hub per service
#[derive(Clone)]
pub struct SentryBackendFactory {
    transport: Option<Arc<dyn TransportFactory>>,
    flush_timeout: Duration,
}

impl SentryBackendFactory {
    pub fn new() -> Self {
        Self { transport: None, flush_timeout: DEFAULT_FLUSH_TIMEOUT }
    }

    /// Replace the HTTP transport, e.g. with `sentry::test::TestTransport`
    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn TransportFactory>) -> Self {
        self.transport = Some(transport);
        self
    }

    #[must_use]
    pub fn with_flush_timeout(mut self, timeout: Duration) -> Self {
        self.flush_timeout = timeout;
        self
    }

    /// SDK options for `config`.
    ///
    /// A configuration whose DSN failed validation yields options without a
    /// DSN, so the resulting client is disabled.
    ///
    /// # Errors
    /// `FaultlineError::Backend` when the SDK rejects a DSN that passed
    /// validation.
    pub fn client_options(&self, config: &ClientConfig) -> Result<ClientOptions> {
        let dsn = match config.raw_dsn() {
            Some(raw) if !config.has_dsn_error() => {
                Some(raw.parse().map_err(IntoFaultlineError::into_faultline)?)
            }
            _ => None,
        };

        let transport = self
            .transport
            .clone()
            .unwrap_or_else(|| Arc::new(DefaultTransportFactory) as Arc<dyn TransportFactory>);

        let mut options = ClientOptions {
            dsn,
            environment: Some(Cow::Owned(config.environment().to_string())),
            release: config.release().map(|release| Cow::Owned(release.to_string())),
            send_default_pii: config.send_default_pii(),
            auto_session_tracking: config.auto_session_tracking(),
            default_integrations: false,
            transport: Some(transport),
            ..Default::default()
        };

        if let Some(filter) = config.event_filter() {
            let filter = Arc::clone(filter);
            options.before_send = Some(Arc::new(move |event: Event<'static>| {
                filter_outgoing(filter.as_ref(), event)
            }));
        }
        Ok(options)
    }
}

impl Default for SentryBackendFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SentryBackendFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SentryBackendFactory")
            .field("custom_transport", &self.transport.is_some())
            .field("flush_timeout", &self.flush_timeout)
            .finish()
    }
}

impl BackendFactory for SentryBackendFactory {
    fn create_client(&self, config: ClientConfig, scope: Scope) -> Result<Arc<dyn BackendClient>> {
        let client = Arc::new(Client::from(self.client_options(&config)?));

        let mut sentry_scope = sentry::Scope::default();
        for (key, value) in &scope.tags {
            sentry_scope.set_tag(key, value);
        }
        if let Some(transaction) = scope.transaction.as_deref() {
            sentry_scope.set_transaction(Some(transaction));
        }

        let hub = Arc::new(Hub::new(Some(Arc::clone(&client)), Arc::new(sentry_scope)));
        Ok(Arc::new(SentryClient::new(config, client, hub, self.flush_timeout)))
    }

    fn default_excluded_errors(&self) -> Vec<String> {
        DEFAULT_EXCLUDED_ERRORS.iter().map(|kind| (*kind).to_string()).collect()
    }
}

/// Run the parameter filter over the user-data sections of an event.
///
/// Protocol fields (`event_id`, `timestamp`, `level`, `sdk`, exception types,
/// stack frames) never pass through the filter. Each section is filtered
/// under its own top-level key so dotted rules see the same paths as in the
/// serialised event.
fn filter_outgoing(filter: &dyn EventFilter, mut event: Event<'static>) -> Option<Event<'static>> {
    event.extra = redact_section(filter, "extra", std::mem::take(&mut event.extra));
    event.tags = redact_section(filter, "tags", std::mem::take(&mut event.tags));
    event.contexts = redact_section(filter, "contexts", std::mem::take(&mut event.contexts));
    event.user = redact_section(filter, "user", event.user.take());
    event.request = redact_section(filter, "request", event.request.take());
    event.breadcrumbs =
        redact_section(filter, "breadcrumbs", std::mem::take(&mut event.breadcrumbs));
    Some(event)
}

/// A section the filter leaves unreadable is dropped, never sent unfiltered.
fn redact_section<T>(filter: &dyn EventFilter, key: &str, section: T) -> T
where
    T: Serialize + DeserializeOwned + Default,
{
    let serialized = match serde_json::to_value(&section) {
        Ok(Value::Null) => return section,
        Ok(value) => value,
        Err(err) => {
            warn!(section = key, error = %err, "Dropping event section that failed to serialise");
            return T::default();
        }
    };

    let mut wrapped = Map::new();
    wrapped.insert(key.to_string(), serialized);
    let filtered = match filter.filter_event(Value::Object(wrapped)) {
        Value::Object(mut map) => map.remove(key).unwrap_or(Value::Null),
        _ => Value::Null,
    };

    serde_json::from_value(filtered).unwrap_or_else(|err| {
        warn!(
            section = key,
            error = %err,
            "Dropping event section the parameter filter made unreadable"
        );
        T::default()
    })
}
