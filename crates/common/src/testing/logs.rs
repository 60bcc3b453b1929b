//! In-memory `tracing` layer for asserting on log output.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::{Layer, Registry};

/// A single recorded log event.
#[derive(Debug, Clone)]
pub struct CapturedLog {
    pub level: Level,
    pub target: String,
    pub message: String,
    pub fields: BTreeMap<String, String>,
}

/// Records every event it sees.
///
/// Cloning shares the underlying buffer, so a clone can be installed as a
/// subscriber layer while the original is used for assertions.
#[derive(Debug, Clone, Default)]
pub struct LogCapture {
    events: Arc<Mutex<Vec<CapturedLog>>>,
}

impl LogCapture {
    /// Create an empty capture
    pub fn new() -> Self {
        Self::default()
    }

    /// A subscriber that forwards every event into this capture.
    pub fn subscriber(&self) -> impl Subscriber + Send + Sync {
        Registry::default().with(self.clone())
    }

    /// Run `f` with this capture installed as the thread-local default
    /// subscriber.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::subscriber::with_default(self.subscriber(), f)
    }

    /// Snapshot of every event recorded so far
    pub fn events(&self) -> Vec<CapturedLog> {
        self.lock_events().clone()
    }

    /// Number of events recorded at exactly `level`
    pub fn count_at(&self, level: Level) -> usize {
        self.lock_events().iter().filter(|event| event.level == level).count()
    }

    /// True when any event message or field value contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.lock_events().iter().any(|event| {
            event.message.contains(needle) || event.fields.values().any(|v| v.contains(needle))
        })
    }

    /// Drop everything recorded so far
    pub fn clear(&self) {
        self.lock_events().clear();
    }

    fn lock_events(&self) -> MutexGuard<'_, Vec<CapturedLog>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<S: Subscriber> Layer<S> for LogCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldCollector::default();
        event.record(&mut visitor);

        let metadata = event.metadata();
        self.lock_events().push(CapturedLog {
            level: *metadata.level(),
            target: metadata.target().to_string(),
            message: visitor.message,
            fields: visitor.fields,
        });
    }
}

#[derive(Default)]
struct FieldCollector {
    message: String,
    fields: BTreeMap<String, String>,
}

impl Visit for FieldCollector {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.insert(field.name().to_string(), value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields.insert(field.name().to_string(), format!("{value:?}"));
        }
    }
}
