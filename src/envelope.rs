//! Result envelope types
//!
//! Every call kind's response is normalized into a [`ResultEnvelope`]. Which
//! variant is legal depends on the call kind, but the wire forms are shared:
//! content-item lists for tools and resources, role-tagged messages for
//! prompts and sampling, a structured payload where the kind supports one,
//! the `"Done"` sentinel for void methods, and the error-flagged form for
//! tool failures.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// A single piece of content inside an envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentItem {
    /// Plain text.
    Text { text: String },
    /// Binary data with its mime type. `data` is the host's encoding
    /// (typically base64); the engine passes it through untouched.
    Blob {
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
}

impl ContentItem {
    /// A text item.
    pub fn text(text: impl Into<String>) -> Self {
        ContentItem::Text { text: text.into() }
    }

    /// A blob item with the given mime type.
    pub fn blob(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        ContentItem::Blob {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }

    /// The text, if this is a text item.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentItem::Text { text } => Some(text),
            ContentItem::Blob { .. } => None,
        }
    }
}

/// Who a message is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// A role-tagged content item, as used by prompt and sampling envelopes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageItem {
    pub role: MessageRole,
    pub content: ContentItem,
}

impl MessageItem {
    /// A user message with text content.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: ContentItem::text(text),
        }
    }

    /// An assistant message with text content.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: ContentItem::text(text),
        }
    }
}

/// The normalized result of one invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultEnvelope {
    /// A list of content items (tool and resource kinds).
    Content(Vec<ContentItem>),
    /// A structured JSON payload (kinds that support one).
    Structured(Value),
    /// A list of role-tagged messages (prompt and sampling kinds).
    Messages(Vec<MessageItem>),
    /// The void sentinel. Serializes as the quoted string `"Done"` so a
    /// void method never produces an empty result on the wire.
    Done,
    /// A tool failure folded into the response, with `isError: true`.
    ErrorFlagged { text: String },
}

impl ResultEnvelope {
    /// A single text item.
    pub fn text(text: impl Into<String>) -> Self {
        ResultEnvelope::Content(vec![ContentItem::text(text)])
    }

    /// An error-flagged envelope.
    pub fn error(text: impl Into<String>) -> Self {
        ResultEnvelope::ErrorFlagged { text: text.into() }
    }

    /// A structured payload.
    pub fn structured(value: Value) -> Self {
        ResultEnvelope::Structured(value)
    }

    /// Whether this envelope carries the error flag.
    pub fn is_error(&self) -> bool {
        matches!(self, ResultEnvelope::ErrorFlagged { .. })
    }

    /// The first text item, if any.
    pub fn first_text(&self) -> Option<&str> {
        match self {
            ResultEnvelope::Content(items) => items.iter().find_map(ContentItem::as_text),
            ResultEnvelope::Messages(msgs) => msgs.iter().find_map(|m| m.content.as_text()),
            ResultEnvelope::ErrorFlagged { text } => Some(text),
            _ => None,
        }
    }

    /// The wire form of this envelope.
    pub fn to_wire(&self) -> Value {
        match self {
            ResultEnvelope::Content(items) => serde_json::json!({ "content": items }),
            ResultEnvelope::Structured(value) => {
                let text = serde_json::to_string_pretty(value).unwrap_or_default();
                serde_json::json!({
                    "content": [ContentItem::text(text)],
                    "structuredContent": value,
                })
            }
            ResultEnvelope::Messages(messages) => serde_json::json!({ "messages": messages }),
            ResultEnvelope::Done => Value::String("Done".to_string()),
            ResultEnvelope::ErrorFlagged { text } => serde_json::json!({
                "content": [ContentItem::text(text.clone())],
                "isError": true,
            }),
        }
    }
}

impl Serialize for ResultEnvelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_wire().serialize(serializer)
    }
}
