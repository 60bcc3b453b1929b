// Key-based redaction of JSON payloads.
//
// Rules come in three shapes:
// - plain words (`password`, `token`) match any key containing them, ignoring case
// - `/regex/` rules match keys against the regex
// - dotted rules (`card.number`) match the full path of a nested key

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde_json::{Map, Value};

use crate::error::{CommonError, CommonResult};

/// Replacement written in place of every filtered value.
pub const FILTERED_MASK: &str = "[FILTERED]";

static REGEX_RULE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/(.+)/(i?)$").expect("REGEX_RULE should compile - this is a bug"));

#[derive(Debug, Clone)]
enum KeyMatcher {
    /// Matched against the bare key
    Key(Regex),
    /// Matched against the dotted path from the root
    Path(Regex),
}

/// Redacts values whose keys match a configured set of rules.
///
/// # Example
/// ```
/// use faultline_common::privacy::ParameterFilter;
/// use serde_json::json;
///
/// let filter = ParameterFilter::new(["password", "card.number"]).unwrap();
/// let filtered = filter.filter_value(json!({
///     "user": { "password": "hunter2", "name": "ada" },
///     "card": { "number": "4111", "brand": "visa" }
/// }));
///
/// assert_eq!(filtered["user"]["password"], "[FILTERED]");
/// assert_eq!(filtered["user"]["name"], "ada");
/// assert_eq!(filtered["card"]["number"], "[FILTERED]");
/// ```
#[derive(Debug, Clone)]
pub struct ParameterFilter {
    matchers: Vec<KeyMatcher>,
    mask: String,
}

impl ParameterFilter {
    /// Compile a filter from rule strings.
    ///
    /// # Errors
    /// Returns `CommonError::Validation` when a rule is empty or a `/regex/`
    /// rule does not compile.
    pub fn new<I, S>(rules: I) -> CommonResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut words = Vec::new();
        let mut matchers = Vec::new();

        for rule in rules {
            let rule = rule.as_ref().trim();
            if rule.is_empty() {
                return Err(CommonError::validation("filter_parameters", "empty filter rule"));
            }

            if let Some(caps) = REGEX_RULE.captures(rule) {
                let regex = RegexBuilder::new(&caps[1])
                    .case_insensitive(!caps[2].is_empty())
                    .build()
                    .map_err(|e| {
                        CommonError::validation_with_value("filter_parameters", e.to_string(), rule)
                    })?;
                matchers.push(KeyMatcher::Key(regex));
            } else if rule.contains('.') {
                let regex = RegexBuilder::new(&format!("^{}$", regex::escape(rule)))
                    .case_insensitive(true)
                    .build()?;
                matchers.push(KeyMatcher::Path(regex));
            } else {
                words.push(regex::escape(rule));
            }
        }

        if !words.is_empty() {
            let combined = RegexBuilder::new(&words.join("|")).case_insensitive(true).build()?;
            matchers.insert(0, KeyMatcher::Key(combined));
        }

        Ok(Self { matchers, mask: FILTERED_MASK.to_string() })
    }

    /// Use a custom mask instead of [`FILTERED_MASK`].
    pub fn with_mask(mut self, mask: impl Into<String>) -> Self {
        self.mask = mask.into();
        self
    }

    /// True when no rules are configured.
    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    /// Filter every level of a JSON object.
    pub fn filter(&self, payload: Map<String, Value>) -> Map<String, Value> {
        if self.is_empty() {
            return payload;
        }
        self.filter_map(payload, None)
    }

    /// Filter an arbitrary JSON value; non-object roots are walked too.
    pub fn filter_value(&self, value: Value) -> Value {
        if self.is_empty() {
            return value;
        }
        self.walk(value, None)
    }

    fn filter_map(&self, map: Map<String, Value>, parent: Option<&str>) -> Map<String, Value> {
        map.into_iter()
            .map(|(key, value)| {
                let path = match parent {
                    Some(parent) => format!("{parent}.{key}"),
                    None => key.clone(),
                };
                let value = if self.is_filtered(&key, &path) {
                    Value::String(self.mask.clone())
                } else {
                    self.walk(value, Some(&path))
                };
                (key, value)
            })
            .collect()
    }

    fn walk(&self, value: Value, path: Option<&str>) -> Value {
        match value {
            Value::Object(map) => Value::Object(self.filter_map(map, path)),
            Value::Array(items) => {
                Value::Array(items.into_iter().map(|item| self.walk(item, path)).collect())
            }
            other => other,
        }
    }

    fn is_filtered(&self, key: &str, path: &str) -> bool {
        self.matchers.iter().any(|matcher| match matcher {
            KeyMatcher::Key(regex) => regex.is_match(key),
            KeyMatcher::Path(regex) => regex.is_match(path),
        })
    }
}
