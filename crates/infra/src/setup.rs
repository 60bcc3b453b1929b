//! One-call wiring of a [`ReportingContext`] to the Sentry backend

use std::sync::Arc;

use faultline_core::{AdapterOptions, BackendFactory, ReportingContext};
use faultline_domain::{AdapterSettings, Result};

use crate::backend::SentryBackendFactory;
use crate::config;
use crate::dsn::{DsnLookupChain, EnvDsnLookup, StaticDsnLookup};

/// DSN lookup used by [`configure`]: the settings table first, then
/// `FAULTLINE_DSN_<SERVICE>` variables
pub fn default_dsn_lookup(settings: &AdapterSettings) -> DsnLookupChain {
    DsnLookupChain::new().then(StaticDsnLookup::from_settings(settings)).then(EnvDsnLookup::new())
}

/// Configure `context` from `settings` with the default DSN lookup and the
/// given backend.
///
/// # Errors
/// Invalid settings or filter rules, or a backend that cannot build the
/// main client.
pub fn configure_with_backend(
    context: &ReportingContext,
    settings: AdapterSettings,
    backend: Arc<dyn BackendFactory>,
) -> Result<()> {
    let lookup = Arc::new(default_dsn_lookup(&settings));
    let options = AdapterOptions::new(settings, lookup)?;
    context.configure(options, backend)
}

/// Configure `context` against Sentry.
///
/// # Errors
/// Same as [`configure_with_backend`].
pub fn configure(context: &ReportingContext, settings: AdapterSettings) -> Result<()> {
    configure_with_backend(context, settings, Arc::new(SentryBackendFactory::new()))
}

/// Load settings with [`config::load`] and configure the global context.
///
/// # Errors
/// Settings that cannot be loaded, plus everything [`configure`] rejects.
pub fn configure_global_from_environment() -> Result<&'static ReportingContext> {
    let settings = config::load()?;
    let context = ReportingContext::global();
    configure(context, settings)?;
    Ok(context)
}
