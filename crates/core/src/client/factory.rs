//! Client factory - resolves per-service configuration and builds clients

use std::collections::BTreeSet;
use std::sync::Arc;

use faultline_domain::constants::ALWAYS_REPORTED_ERROR;
use faultline_domain::{AdapterSettings, Result, Scope, ServiceName};
use tracing::{debug, info};

use super::config::{ClientConfig, ClientConfigParams};
use super::ports::{BackendClient, BackendFactory, DsnLookup, EventFilter};

/// Builds [`ClientConfig`]s and backend clients for service names.
#[derive(Clone)]
pub struct ClientFactory {
    settings: Arc<AdapterSettings>,
    dsn_lookup: Arc<dyn DsnLookup>,
    event_filter: Option<Arc<dyn EventFilter>>,
    backend: Arc<dyn BackendFactory>,
}

impl ClientFactory {
    pub fn new(
        settings: Arc<AdapterSettings>,
        dsn_lookup: Arc<dyn DsnLookup>,
        event_filter: Option<Arc<dyn EventFilter>>,
        backend: Arc<dyn BackendFactory>,
    ) -> Self {
        Self { settings, dsn_lookup, event_filter, backend }
    }

    pub fn settings(&self) -> &AdapterSettings {
        &self.settings
    }

    /// Resolve the configuration for `service`.
    ///
    /// A service without its own DSN falls back to the default service's
    /// DSN. The result is never an error; validation problems are recorded
    /// on the returned config.
    pub fn build_config(&self, service: &ServiceName) -> ClientConfig {
        let default_service = &self.settings.default_service_name;

        let dsn = match self.dsn_lookup.lookup(service) {
            Some(dsn) => Some(dsn),
            None => {
                info!(
                    service = %service,
                    environment = %self.settings.deployment_environment,
                    "No DSN for service, falling back to default service"
                );
                self.dsn_lookup.lookup(default_service)
            }
        };

        let config = ClientConfig::new(ClientConfigParams {
            service: service.clone(),
            dsn,
            environment: self.settings.deployment_environment.clone(),
            release: self.settings.release_version.clone(),
            excluded_errors: self.excluded_errors(),
            event_filter: self.event_filter.clone(),
        });

        if !config.sending_allowed() {
            debug!(service = %service, errors = ?config.errors(), "Client config has errors");
        }
        config
    }

    /// Build a client for `service` bound to a copy of `scope`
    ///
    /// # Errors
    /// Propagates failures from the backend factory.
    pub fn build_client(
        &self,
        service: &ServiceName,
        scope: Scope,
    ) -> Result<Arc<dyn BackendClient>> {
        let config = self.build_config(service);
        self.backend.create_client(config, scope)
    }

    /// Backend defaults plus configured exclusions, minus the error kind that
    /// must always be reported
    fn excluded_errors(&self) -> BTreeSet<String> {
        let mut excluded: BTreeSet<String> =
            self.backend.default_excluded_errors().into_iter().collect();
        excluded.extend(self.settings.errors_to_exclude.iter().cloned());
        excluded.remove(ALWAYS_REPORTED_ERROR);
        excluded
    }
}
