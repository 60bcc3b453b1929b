//! Filter chain registry
//!
//! Append-only, de-duplicated lists of transformers and suppressors. Readers
//! take a cheap snapshot; writers serialise on the shared coarse lock and
//! publish a new list.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use super::ports::{ExceptionSuppressor, Transformer};

pub type TransformerList = Arc<[Arc<dyn Transformer>]>;
pub type SuppressorList = Arc<[Arc<dyn ExceptionSuppressor>]>;

pub struct FilterChain {
    transformers: RwLock<TransformerList>,
    suppressors: RwLock<SuppressorList>,
    lock: Arc<Mutex<()>>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::with_lock(Arc::new(Mutex::new(())))
    }

    pub fn with_lock(lock: Arc<Mutex<()>>) -> Self {
        Self {
            transformers: RwLock::new(Arc::from(Vec::new())),
            suppressors: RwLock::new(Arc::from(Vec::new())),
            lock,
        }
    }

    /// Append `transformer` unless this exact instance is already registered.
    /// Returns whether it was added.
    pub fn register_transformer(&self, transformer: Arc<dyn Transformer>) -> bool {
        let _guard = self.lock.lock();
        let added = append_unique(&self.transformers, transformer);
        if added {
            debug!(count = self.transformers.read().len(), "Registered transformer");
        }
        added
    }

    /// Append `suppressor` unless this exact instance is already registered.
    /// Returns whether it was added.
    pub fn register_suppressor(&self, suppressor: Arc<dyn ExceptionSuppressor>) -> bool {
        let _guard = self.lock.lock();
        let added = append_unique(&self.suppressors, suppressor);
        if added {
            debug!(count = self.suppressors.read().len(), "Registered suppressor");
        }
        added
    }

    /// Registered transformers in registration order
    pub fn transformers(&self) -> TransformerList {
        Arc::clone(&self.transformers.read())
    }

    /// Registered suppressors in registration order
    pub fn suppressors(&self) -> SuppressorList {
        Arc::clone(&self.suppressors.read())
    }

    pub fn clear(&self) {
        let _guard = self.lock.lock();
        *self.transformers.write() = Arc::from(Vec::new());
        *self.suppressors.write() = Arc::from(Vec::new());
    }
}

impl Default for FilterChain {
    fn default() -> Self {
        Self::new()
    }
}

fn append_unique<T: ?Sized>(slot: &RwLock<Arc<[Arc<T>]>>, item: Arc<T>) -> bool {
    let current = Arc::clone(&slot.read());
    let duplicate =
        current.iter().any(|existing| std::ptr::addr_eq(Arc::as_ptr(existing), Arc::as_ptr(&item)));
    if duplicate {
        return false;
    }
    let mut next: Vec<Arc<T>> = current.to_vec();
    next.push(item);
    *slot.write() = Arc::from(next);
    true
}
