//! Per-service client cache
//!
//! Lookups of already-cached services go straight to the concurrent map.
//! Misses take the coarse lock, re-check, and only then build, so a service
//! is constructed at most once no matter how many threads race on first use.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use faultline_domain::{Result, ServiceName};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use tracing::debug;

use crate::client::BackendClient;

/// A client handle plus whether it is the real target for its service.
///
/// `configured == false` means the DSN could not be resolved and `client`
/// is a degraded stand-in.
#[derive(Clone)]
pub struct ResolvedClient {
    pub client: Arc<dyn BackendClient>,
    pub configured: bool,
}

impl fmt::Debug for ResolvedClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedClient")
            .field("service", self.client.configuration().service())
            .field("configured", &self.configured)
            .finish()
    }
}

/// Lazily populated map from service name to client
pub struct HubCache {
    entries: OnceCell<DashMap<ServiceName, Arc<dyn BackendClient>>>,
    lock: Arc<Mutex<()>>,
}

impl HubCache {
    /// Cache guarded by its own lock
    pub fn new() -> Self {
        Self::with_lock(Arc::new(Mutex::new(())))
    }

    /// Cache sharing `lock` with other process-wide registries
    pub fn with_lock(lock: Arc<Mutex<()>>) -> Self {
        Self { entries: OnceCell::new(), lock }
    }

    fn entries(&self) -> &DashMap<ServiceName, Arc<dyn BackendClient>> {
        self.entries.get_or_init(|| {
            let _guard = self.lock.lock();
            DashMap::new()
        })
    }

    /// Return the cached client for `service`, building it with `build` on a
    /// miss.
    ///
    /// A freshly built client is cached only when its configuration has a
    /// usable DSN; otherwise it is handed back with `configured = false` and
    /// the next call builds again.
    ///
    /// # Errors
    /// Propagates errors from `build`; nothing is cached in that case.
    pub fn resolve<F>(&self, service: &ServiceName, build: F) -> Result<ResolvedClient>
    where
        F: FnOnce(&ServiceName) -> Result<Arc<dyn BackendClient>>,
    {
        let entries = self.entries();

        if let Some(client) = entries.get(service) {
            return Ok(ResolvedClient { client: Arc::clone(client.value()), configured: true });
        }

        let _guard = self.lock.lock();

        if let Some(client) = entries.get(service) {
            return Ok(ResolvedClient { client: Arc::clone(client.value()), configured: true });
        }

        let client = build(service)?;
        if client.configuration().has_dsn_error() {
            debug!(service = %service, "Client has no usable DSN, not caching");
            return Ok(ResolvedClient { client, configured: false });
        }

        entries.insert(service.clone(), Arc::clone(&client));
        debug!(service = %service, "Cached client for service");
        Ok(ResolvedClient { client, configured: true })
    }

    pub fn get(&self, service: &ServiceName) -> Option<Arc<dyn BackendClient>> {
        self.entries.get()?.get(service).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains(&self, service: &ServiceName) -> bool {
        self.entries.get().is_some_and(|entries| entries.contains_key(service))
    }

    pub fn len(&self) -> usize {
        self.entries.get().map_or(0, DashMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every cached client
    pub fn invalidate(&self) {
        let _guard = self.lock.lock();
        if let Some(entries) = self.entries.get() {
            entries.clear();
        }
    }
}

impl Default for HubCache {
    fn default() -> Self {
        Self::new()
    }
}
