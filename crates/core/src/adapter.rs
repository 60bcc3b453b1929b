//! Reporting context - the adapter's process-wide state
//!
//! Owns the settings, the client factory, the main client, the hub cache and
//! the filter chain. `configure` replaces everything except the registered
//! filters; `reset` clears those too.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use faultline_common::ParameterFilter;
use faultline_domain::{AdapterSettings, FaultlineError, Result, Scope, ServiceName};
use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};
use tracing::{error, info};

use crate::client::{BackendClient, BackendFactory, ClientFactory, DsnLookup, EventFilter};
use crate::hub::{HubCache, ResolvedClient};
use crate::pipeline::{ExceptionSuppressor, FilterChain, Gating, Recorder, Transformer};

static GLOBAL: Lazy<ReportingContext> = Lazy::new(ReportingContext::new);

/// Everything `configure` needs besides the backend factory
#[derive(Clone)]
pub struct AdapterOptions {
    pub settings: AdapterSettings,
    pub dsn_lookup: Arc<dyn DsnLookup>,
    pub event_filter: Option<Arc<dyn EventFilter>>,
}

impl AdapterOptions {
    /// Options with the parameter filter compiled from
    /// `settings.filter_parameters`.
    ///
    /// # Errors
    /// Returns `FaultlineError::Config` when a filter rule is invalid.
    pub fn new(settings: AdapterSettings, dsn_lookup: Arc<dyn DsnLookup>) -> Result<Self> {
        let event_filter: Option<Arc<dyn EventFilter>> =
            if settings.filter_parameters.is_empty() {
                None
            } else {
                let filter = ParameterFilter::new(&settings.filter_parameters)
                    .map_err(|e| FaultlineError::Config(e.to_string()))?;
                Some(Arc::new(filter))
            };
        Ok(Self { settings, dsn_lookup, event_filter })
    }

    /// Replace the event filter
    pub fn with_event_filter(mut self, filter: Arc<dyn EventFilter>) -> Self {
        self.event_filter = Some(filter);
        self
    }
}

struct ContextState {
    settings: Arc<AdapterSettings>,
    factory: ClientFactory,
    scope: Scope,
    main_client: Arc<dyn BackendClient>,
    hub: HubCache,
    extras_to_tags: Arc<[String]>,
    gating: Gating,
}

/// Process-wide reporting state with an explicit lifecycle.
pub struct ReportingContext {
    state: RwLock<Option<Arc<ContextState>>>,
    filters: FilterChain,
    lock: Arc<Mutex<()>>,
}

impl ReportingContext {
    pub fn new() -> Self {
        let lock = Arc::new(Mutex::new(()));
        Self { state: RwLock::new(None), filters: FilterChain::with_lock(Arc::clone(&lock)), lock }
    }

    /// Shared process-wide context
    pub fn global() -> &'static Self {
        &GLOBAL
    }

    /// Install settings and collaborators, build the main client and start
    /// from an empty hub cache.
    ///
    /// # Errors
    /// Returns an error when the settings are invalid or the backend cannot
    /// build the main client. Previous state is kept in that case.
    pub fn configure(
        &self,
        options: AdapterOptions,
        backend: Arc<dyn BackendFactory>,
    ) -> Result<()> {
        options.settings.validate()?;

        let settings = Arc::new(options.settings);
        let mut scope = Scope::new();
        scope.set_tags(settings.global_tags());

        let factory = ClientFactory::new(
            Arc::clone(&settings),
            options.dsn_lookup,
            options.event_filter,
            backend,
        );
        let main_client = factory.build_client(&settings.default_service_name, scope.clone())?;

        let state = ContextState {
            extras_to_tags: settings.extras_to_tags.iter().cloned().collect(),
            gating: Gating::from_settings(&settings),
            hub: HubCache::with_lock(Arc::clone(&self.lock)),
            settings: Arc::clone(&settings),
            factory,
            scope,
            main_client,
        };

        *self.state.write() = Some(Arc::new(state));
        info!(
            environment = %settings.deployment_environment,
            default_service = %settings.default_service_name,
            "Reporting context configured"
        );
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        self.state.read().is_some()
    }

    pub fn settings(&self) -> Option<Arc<AdapterSettings>> {
        self.state.read().as_ref().map(|state| Arc::clone(&state.settings))
    }

    /// Scope applied to every client built from now on
    pub fn global_scope(&self) -> Option<Scope> {
        self.state.read().as_ref().map(|state| state.scope.clone())
    }

    pub fn main_client(&self) -> Option<Arc<dyn BackendClient>> {
        self.state.read().as_ref().map(|state| Arc::clone(&state.main_client))
    }

    /// Client for `service` (the default service when `None`).
    ///
    /// The default service reuses the main client. Other services get a
    /// client of their own, bound to a copy of the global scope.
    ///
    /// # Errors
    /// `FaultlineError::Config` when not configured; backend errors while
    /// building a client.
    pub fn resolve(&self, service: Option<&ServiceName>) -> Result<ResolvedClient> {
        let state = self.current_state()?;
        let service = service.unwrap_or(&state.settings.default_service_name);
        Self::resolve_in(&state, service)
    }

    /// Recorder bound to the client for `service`
    ///
    /// # Errors
    /// Same as [`resolve`](Self::resolve).
    pub fn recorder(&self, service: Option<&ServiceName>) -> Result<Recorder> {
        let state = self.current_state()?;
        let service = service.unwrap_or(&state.settings.default_service_name).clone();
        let resolved = Self::resolve_in(&state, &service)?;
        Ok(Recorder::new(
            service,
            resolved,
            &self.filters,
            Arc::clone(&state.extras_to_tags),
            state.gating,
        ))
    }

    /// Run `body` with a recorder for `service`, never letting a failure
    /// escape.
    ///
    /// Resolution errors, errors returned by `body` and panics inside it are
    /// logged once at error level and turned into `None`.
    pub fn with_rescued_exceptions<T, F>(
        &self,
        service: Option<&ServiceName>,
        body: F,
    ) -> Option<T>
    where
        F: FnOnce(&Recorder) -> anyhow::Result<T>,
    {
        let outcome = catch_unwind(AssertUnwindSafe(|| -> anyhow::Result<T> {
            let recorder = self.recorder(service)?;
            body(&recorder)
        }));

        match outcome {
            Ok(Ok(value)) => Some(value),
            Ok(Err(err)) => {
                error!(
                    service = ?service.map(ServiceName::as_str),
                    error = %format!("{err:#}"),
                    "Rescued error while reporting"
                );
                None
            }
            Err(panic) => {
                let reason = panic_message(panic.as_ref());
                error!(
                    service = ?service.map(ServiceName::as_str),
                    error = %reason,
                    "Rescued panic while reporting"
                );
                None
            }
        }
    }

    pub fn register_transformer(&self, transformer: Arc<dyn Transformer>) -> bool {
        self.filters.register_transformer(transformer)
    }

    pub fn register_suppressor(&self, suppressor: Arc<dyn ExceptionSuppressor>) -> bool {
        self.filters.register_suppressor(suppressor)
    }

    pub fn filters(&self) -> &FilterChain {
        &self.filters
    }

    /// Remove every registered transformer and suppressor
    pub fn clear_filters(&self) {
        self.filters.clear();
    }

    /// Drop all state; the context reports nothing until configured again
    pub fn reset(&self) {
        if let Some(state) = self.state.write().take() {
            state.hub.invalidate();
        }
        self.filters.clear();
    }

    fn current_state(&self) -> Result<Arc<ContextState>> {
        self.state
            .read()
            .as_ref()
            .map(Arc::clone)
            .ok_or_else(|| FaultlineError::Config("reporting context is not configured".into()))
    }

    fn resolve_in(state: &ContextState, service: &ServiceName) -> Result<ResolvedClient> {
        state.hub.resolve(service, |service| {
            if *service == state.settings.default_service_name {
                Ok(Arc::clone(&state.main_client))
            } else {
                state.factory.build_client(service, state.scope.clone())
            }
        })
    }
}

impl fmt::Debug for ReportingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("ReportingContext")
            .field("configured", &state.is_some())
            .field("cached_clients", &state.as_ref().map_or(0, |s| s.hub.len()))
            .field("transformers", &self.filters.transformers().len())
            .field("suppressors", &self.filters.suppressors().len())
            .finish()
    }
}

impl Default for ReportingContext {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
