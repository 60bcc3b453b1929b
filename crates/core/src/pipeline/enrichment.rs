//! Copies selected extras into searchable tags

use faultline_domain::CaptureOptions;
use serde_json::Value;

/// For each key in `keys`, copy `extra[key]` into `tags[key]` unless the tag
/// is already set. `null` and `false` extras count as absent.
pub fn enrich_extras_to_tags(options: &mut CaptureOptions, keys: &[String]) {
    let Some(extra) = options.extra.as_ref() else {
        return;
    };

    let additions: Vec<(String, String)> = keys
        .iter()
        .filter_map(|key| {
            let value = extra.get(key)?;
            tag_value(value).map(|tag| (key.clone(), tag))
        })
        .collect();

    for (key, value) in additions {
        options.set_tag_if_absent(&key, value);
    }
}

fn tag_value(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
