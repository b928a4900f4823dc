//! Incoming request and metadata accessor types
//!
//! [`IncomingRequest`] is the untyped, per-call view of a protocol request:
//! a logical name, a named-argument map, and the optional metadata, progress
//! token, and location string that some call kinds carry. It is supplied
//! fresh for every invocation and never retained beyond it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A token the client supplied for progress correlation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProgressToken {
    Number(i64),
    String(String),
}

/// The untyped incoming request a handler is invoked with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingRequest {
    /// Logical name of the target (tool name, prompt name, ...).
    pub name: String,
    /// Named arguments, keyed by argument name.
    #[serde(default)]
    pub arguments: Map<String, Value>,
    /// Request metadata, if the client sent any.
    #[serde(rename = "_meta", default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
    /// Progress token, if the client asked for progress updates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_token: Option<ProgressToken>,
    /// Concrete location string for resource reads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    /// The raw protocol request value, when the host keeps it around.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<Value>,
}

impl IncomingRequest {
    /// Create a request with the given logical name and no arguments.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add one named argument.
    pub fn arg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.insert(name.into(), value.into());
        self
    }

    /// Replace the whole argument map.
    pub fn with_arguments(mut self, arguments: Map<String, Value>) -> Self {
        self.arguments = arguments;
        self
    }

    /// Attach request metadata.
    pub fn with_meta(mut self, meta: Map<String, Value>) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Attach a progress token.
    pub fn with_progress_token(mut self, token: ProgressToken) -> Self {
        self.progress_token = Some(token);
        self
    }

    /// Set the concrete location for resource reads.
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Keep the raw protocol request value alongside the decoded fields.
    pub fn with_raw(mut self, raw: Value) -> Self {
        self.raw = Some(raw);
        self
    }
}

/// Read-only accessor over request metadata.
///
/// Always present when a handler declares a metadata parameter: a request
/// without metadata resolves to an empty accessor, so method bodies never
/// see an absent value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Meta {
    entries: Map<String, Value>,
}

impl Meta {
    /// An empty accessor.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wrap a metadata map.
    pub fn new(entries: Map<String, Value>) -> Self {
        Self { entries }
    }

    /// Wrap an optional metadata map, substituting empty for `None`.
    pub fn from_option(entries: Option<Map<String, Value>>) -> Self {
        Self {
            entries: entries.unwrap_or_default(),
        }
    }

    /// Look up an entry by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Look up a string entry by key.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(Value::as_str)
    }

    /// Whether the key is present.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The underlying entries.
    pub fn entries(&self) -> &Map<String, Value> {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_builder_round_trip() {
        let req = IncomingRequest::new("add")
            .arg("a", 5)
            .arg("b", 3)
            .with_progress_token(ProgressToken::Number(42));

        assert_eq!(req.name, "add");
        assert_eq!(req.arguments.get("a"), Some(&json!(5)));
        assert_eq!(req.progress_token, Some(ProgressToken::Number(42)));
        assert!(req.meta.is_none());
    }

    #[test]
    fn test_request_serializes_meta_under_underscore_key() {
        let mut meta = Map::new();
        meta.insert("trace".to_string(), json!("abc"));
        let req = IncomingRequest::new("echo").with_meta(meta);

        let wire = serde_json::to_value(&req).unwrap();
        assert_eq!(wire["_meta"]["trace"], json!("abc"));
    }

    #[test]
    fn test_meta_from_option_substitutes_empty() {
        let meta = Meta::from_option(None);
        assert!(meta.is_empty());
        assert!(meta.get("anything").is_none());
    }

    #[test]
    fn test_meta_accessors() {
        let mut entries = Map::new();
        entries.insert("user".to_string(), json!("ada"));
        let meta = Meta::new(entries);

        assert_eq!(meta.get_str("user"), Some("ada"));
        assert!(meta.contains("user"));
        assert_eq!(meta.len(), 1);
    }

    #[test]
    fn test_progress_token_untagged_wire_form() {
        assert_eq!(
            serde_json::to_value(ProgressToken::Number(3)).unwrap(),
            json!(3)
        );
        assert_eq!(
            serde_json::to_value(ProgressToken::String("t1".into())).unwrap(),
            json!("t1")
        );
    }
}
