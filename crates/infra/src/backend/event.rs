//! Conversion of captures into `sentry` protocol events

use std::borrow::Cow;
use std::collections::BTreeMap;

use faultline_domain::{CaptureOptions, ErrorDescriptor};
use sentry::protocol::{Context, Event, Exception, Frame, Level, Stacktrace, Thread};
use serde_json::{Map, Value};

const NESTED_MESSAGES_EXTRA: &str = "nested_messages";

/// Event carrying `exception` and everything in `options`
pub fn exception_event(exception: &ErrorDescriptor, options: &CaptureOptions) -> Event<'static> {
    let mut event = base_event(options);

    event.exception = vec![Exception {
        ty: exception.kind.clone(),
        value: Some(exception.message.clone()).filter(|message| !message.is_empty()),
        stacktrace: stacktrace(&exception.backtrace),
        ..Default::default()
    }]
    .into();

    if !exception.nested_messages.is_empty() {
        let nested = Value::from(exception.nested_messages.clone());
        event.extra.insert(NESTED_MESSAGES_EXTRA.to_string(), nested);
    }
    event
}

/// Event carrying a plain message; a captured backtrace goes on the current
/// thread
pub fn message_event(message: &str, options: &CaptureOptions) -> Event<'static> {
    let mut event = base_event(options);
    event.message = Some(message.to_string());

    if let Some(frames) = options.backtrace.as_deref() {
        event.threads =
            vec![Thread { stacktrace: stacktrace(frames), current: true, ..Default::default() }]
                .into();
    }
    event
}

fn base_event(options: &CaptureOptions) -> Event<'static> {
    let mut event = Event {
        level: Level::Error,
        transaction: options.transaction.clone(),
        ..Default::default()
    };

    if let Some(extra) = &options.extra {
        event.extra = extra.iter().map(|(key, value)| (key.clone(), value.clone())).collect();
    }
    if let Some(tags) = &options.tags {
        event.tags = tags.clone();
    }
    for (key, value) in &options.contexts {
        event.contexts.insert(key.clone(), context(value));
    }
    apply_fields(&mut event, &options.fields);
    event
}

/// `level` and `fingerprint` map onto the event; anything else becomes an
/// extra
fn apply_fields(event: &mut Event<'static>, fields: &Map<String, Value>) {
    for (key, value) in fields {
        match (key.as_str(), value) {
            ("level", Value::String(level)) => {
                if let Ok(level) = level.parse::<Level>() {
                    event.level = level;
                }
            }
            ("fingerprint", Value::Array(parts)) => {
                let parts: Vec<Cow<'static, str>> = parts
                    .iter()
                    .map(|part| match part {
                        Value::String(s) => Cow::Owned(s.clone()),
                        other => Cow::Owned(other.to_string()),
                    })
                    .collect();
                event.fingerprint = Cow::Owned(parts);
            }
            _ => {
                event.extra.insert(key.clone(), value.clone());
            }
        }
    }
}

fn context(value: &Value) -> Context {
    match value {
        Value::Object(map) => {
            Context::Other(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        }
        other => Context::Other(BTreeMap::from([("value".to_string(), other.clone())])),
    }
}

/// Frames arrive innermost first; the protocol wants them oldest first.
fn stacktrace(frames: &[String]) -> Option<Stacktrace> {
    if frames.is_empty() {
        return None;
    }
    let frames = frames
        .iter()
        .rev()
        .map(|line| Frame { function: Some(line.clone()), ..Default::default() })
        .collect();
    Some(Stacktrace { frames, ..Default::default() })
}
