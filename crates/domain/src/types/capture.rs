//! Capture payloads and outcomes

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::impl_domain_status_conversions;

/// Identifier the backend assigns to a recorded event
pub type EventId = uuid::Uuid;

/// Context sent alongside a captured exception or message.
///
/// `extra` holds free-form context, `tags` holds searchable key/value pairs.
/// Keys the pipeline does not know about are kept in `fields` and passed
/// through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaptureOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Map<String, Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backtrace: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub contexts: Map<String, Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction: Option<String>,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub hint: Map<String, Value>,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl CaptureOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_extra(key, value);
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.get_or_insert_with(BTreeMap::new).insert(key.into(), value.into());
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.contexts.insert(key.into(), value.into());
        self
    }

    pub fn with_hint(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.hint.insert(key.into(), value.into());
        self
    }

    pub fn with_transaction(mut self, name: impl Into<String>) -> Self {
        self.transaction = Some(name.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn set_extra(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.extra.get_or_insert_with(Map::new).insert(key.into(), value.into());
    }

    pub fn extra_value(&self, key: &str) -> Option<&Value> {
        self.extra.as_ref().and_then(|extra| extra.get(key))
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.as_ref().and_then(|tags| tags.get(key)).map(String::as_str)
    }

    /// Insert a tag unless one is already present; returns whether it was
    /// inserted.
    pub fn set_tag_if_absent(&mut self, key: &str, value: impl Into<String>) -> bool {
        let tags = self.tags.get_or_insert_with(BTreeMap::new);
        if tags.contains_key(key) {
            return false;
        }
        tags.insert(key.to_string(), value.into());
        true
    }
}

/// Conversion into capture options that never mutates caller-owned data.
///
/// Borrowed options are cloned before the pipeline touches them; owned
/// options are moved in.
pub trait IntoCaptureOptions<'a> {
    fn into_capture_options(self) -> Cow<'a, CaptureOptions>;
}

impl<'a> IntoCaptureOptions<'a> for CaptureOptions {
    fn into_capture_options(self) -> Cow<'a, CaptureOptions> {
        Cow::Owned(self)
    }
}

impl<'a> IntoCaptureOptions<'a> for &'a CaptureOptions {
    fn into_capture_options(self) -> Cow<'a, CaptureOptions> {
        Cow::Borrowed(self)
    }
}

impl<'a> IntoCaptureOptions<'a> for Option<CaptureOptions> {
    fn into_capture_options(self) -> Cow<'a, CaptureOptions> {
        Cow::Owned(self.unwrap_or_default())
    }
}

/// Why a capture was not dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    InteractiveSession,
    Unconfigured,
    RetryableStorageError,
    Suppressed,
}

impl_domain_status_conversions!(SkipReason {
    InteractiveSession => "interactive_session",
    Unconfigured => "unconfigured",
    RetryableStorageError => "retryable_storage_error",
    Suppressed => "suppressed",
});

/// Result of one pass through the recorder pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// Handed to the backend client, with the id it assigned (if any)
    Dispatched(Option<EventId>),
    /// Dropped by policy
    Skipped(SkipReason),
}

impl CaptureOutcome {
    pub const fn is_dispatched(&self) -> bool {
        matches!(self, Self::Dispatched(_))
    }

    pub const fn event_id(&self) -> Option<EventId> {
        match self {
            Self::Dispatched(id) => *id,
            Self::Skipped(_) => None,
        }
    }

    pub const fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            Self::Dispatched(_) => None,
            Self::Skipped(reason) => Some(*reason),
        }
    }
}
