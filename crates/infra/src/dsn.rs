//! DSN lookups
//!
//! [`StaticDsnLookup`] answers from the settings' `service_dsns` table;
//! [`EnvDsnLookup`] reads `FAULTLINE_DSN_<SERVICE>` variables at lookup time.
//! Chain them with [`DsnLookupChain`] to prefer one source over the other.

use std::collections::BTreeMap;
use std::sync::Arc;

use faultline_core::DsnLookup;
use faultline_domain::{AdapterSettings, ServiceName};

/// Prefix of per-service DSN environment variables
pub const DSN_ENV_PREFIX: &str = "FAULTLINE_DSN_";

/// Lookup over a fixed service → DSN table
#[derive(Debug, Clone, Default)]
pub struct StaticDsnLookup {
    table: BTreeMap<ServiceName, String>,
}

impl StaticDsnLookup {
    /// Table keys are canonicalised; entries whose key is not a valid service
    /// name or whose DSN is blank are skipped.
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let table = entries
            .into_iter()
            .filter_map(|(service, dsn)| {
                let dsn = dsn.into();
                let service = ServiceName::new(service).ok()?;
                (!dsn.trim().is_empty()).then_some((service, dsn))
            })
            .collect();
        Self { table }
    }

    pub fn from_settings(settings: &AdapterSettings) -> Self {
        Self::new(settings.service_dsns.iter())
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl DsnLookup for StaticDsnLookup {
    fn lookup(&self, service: &ServiceName) -> Option<String> {
        self.table.get(service).cloned()
    }
}

/// Lookup reading one environment variable per service
#[derive(Debug, Clone)]
pub struct EnvDsnLookup {
    prefix: String,
}

impl EnvDsnLookup {
    pub fn new() -> Self {
        Self::with_prefix(DSN_ENV_PREFIX)
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    /// Variable consulted for `service`: prefix plus the upper-cased name with
    /// every non-alphanumeric character replaced by `_`
    pub fn variable_for(&self, service: &ServiceName) -> String {
        let suffix: String = service
            .as_str()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
            .collect();
        format!("{}{suffix}", self.prefix)
    }
}

impl Default for EnvDsnLookup {
    fn default() -> Self {
        Self::new()
    }
}

impl DsnLookup for EnvDsnLookup {
    fn lookup(&self, service: &ServiceName) -> Option<String> {
        std::env::var(self.variable_for(service)).ok().filter(|dsn| !dsn.trim().is_empty())
    }
}

/// First lookup with an answer wins
#[derive(Clone, Default)]
pub struct DsnLookupChain {
    lookups: Vec<Arc<dyn DsnLookup>>,
}

impl DsnLookupChain {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn then(mut self, lookup: impl DsnLookup + 'static) -> Self {
        self.lookups.push(Arc::new(lookup));
        self
    }
}

impl DsnLookup for DsnLookupChain {
    fn lookup(&self, service: &ServiceName) -> Option<String> {
        self.lookups.iter().find_map(|lookup| lookup.lookup(service))
    }
}

impl std::fmt::Debug for DsnLookupChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DsnLookupChain").field("lookups", &self.lookups.len()).finish()
    }
}

/// Service table key for a `FAULTLINE_DSN_<SERVICE>` variable
pub(crate) fn service_from_env_key(key: &str) -> Option<String> {
    let suffix = key.strip_prefix(DSN_ENV_PREFIX)?;
    ServiceName::new(suffix).ok().map(String::from)
}
