//! Result normalization
//!
//! Turns the raw [`ReturnValue`] a method produced into the call kind's
//! [`ResultEnvelope`]. The algorithm is shared across kinds; only which
//! variant it lands on differs: message-envelope kinds wrap text into
//! role-tagged messages, kinds with a declared non-text mime type wrap
//! strings as blobs, and kinds without structured-payload support serialize
//! complex values into their textual JSON form.

use crate::envelope::{ContentItem, MessageItem, ResultEnvelope};
use crate::method::ReturnValue;
use crate::params::{MethodBinding, ReturnShape};

/// Normalize a raw return value against the binding's declared contract.
pub fn normalize(binding: &MethodBinding, value: ReturnValue) -> ResultEnvelope {
    match value {
        // Native envelopes pass through unchanged.
        ReturnValue::Envelope(envelope) => envelope,
        // Void is never an empty wire result.
        ReturnValue::Void => ResultEnvelope::Done,
        ReturnValue::Null => neutral(binding),
        ReturnValue::Message(message) => ResultEnvelope::Messages(vec![message]),
        ReturnValue::Messages(messages) => ResultEnvelope::Messages(messages),
        ReturnValue::Text(text) => texts(binding, vec![text]),
        ReturnValue::TextList(items) => texts(binding, items),
        ReturnValue::Structured(value) => structured(binding, value),
        ReturnValue::StructuredList(values) => {
            structured(binding, serde_json::Value::Array(values))
        }
    }
}

/// Wrap plain strings for the binding's call kind: messages for message
/// kinds, blob items when a non-text mime type is declared, text items
/// otherwise.
fn texts(binding: &MethodBinding, items: Vec<String>) -> ResultEnvelope {
    if binding.kind().message_envelope() {
        return ResultEnvelope::Messages(
            items.into_iter().map(MessageItem::assistant).collect(),
        );
    }

    match binding.mime_type() {
        Some(mime) if !mime.starts_with("text/") => {
            let mime = mime.to_string();
            ResultEnvelope::Content(
                items
                    .into_iter()
                    .map(|data| ContentItem::blob(data, mime.clone()))
                    .collect(),
            )
        }
        _ => ResultEnvelope::Content(items.into_iter().map(ContentItem::text).collect()),
    }
}

fn structured(binding: &MethodBinding, value: serde_json::Value) -> ResultEnvelope {
    if binding.kind().supports_structured() {
        ResultEnvelope::Structured(value)
    } else {
        let text = serde_json::to_string(&value).unwrap_or_default();
        texts(binding, vec![text])
    }
}

/// The neutral representation of a null return: an empty list for list
/// shapes, a single text item literally containing "null" otherwise.
fn neutral(binding: &MethodBinding) -> ResultEnvelope {
    match binding.returns().shape {
        ReturnShape::TextList => ResultEnvelope::Content(Vec::new()),
        ReturnShape::MessageList => ResultEnvelope::Messages(Vec::new()),
        ReturnShape::StructuredList if binding.kind().supports_structured() => {
            ResultEnvelope::Structured(serde_json::Value::Array(Vec::new()))
        }
        ReturnShape::StructuredList => ResultEnvelope::Content(Vec::new()),
        _ => texts(binding, vec!["null".to_string()]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::MessageRole;
    use crate::kind::{CallKind, TransportMode};
    use crate::params::{ReturnDecl, ReturnShape};
    use serde_json::json;

    fn binding(kind: CallKind, shape: ReturnShape, mime: Option<&str>) -> MethodBinding {
        MethodBinding::new(
            kind,
            TransportMode::Session,
            Vec::new(),
            ReturnDecl::plain(shape),
            mime.map(String::from),
            None,
        )
    }

    #[test]
    fn test_envelope_passes_through() {
        let b = binding(CallKind::Tool, ReturnShape::Envelope, None);
        let envelope = ResultEnvelope::error("already shaped");
        assert_eq!(
            normalize(&b, ReturnValue::Envelope(envelope.clone())),
            envelope
        );
    }

    #[test]
    fn test_void_is_done_sentinel() {
        let b = binding(CallKind::Tool, ReturnShape::Void, None);
        assert_eq!(normalize(&b, ReturnValue::Void), ResultEnvelope::Done);
    }

    #[test]
    fn test_single_message_becomes_one_element_list() {
        let b = binding(CallKind::Prompt, ReturnShape::Message, None);
        let result = normalize(&b, ReturnValue::Message(MessageItem::user("hi")));
        match result {
            ResultEnvelope::Messages(messages) => {
                assert_eq!(messages.len(), 1);
                assert_eq!(messages[0].role, MessageRole::User);
            }
            other => panic!("unexpected envelope: {other:?}"),
        }
    }

    #[test]
    fn test_text_for_prompt_kind_wraps_into_assistant_message() {
        let b = binding(CallKind::Prompt, ReturnShape::Text, None);
        let result = normalize(&b, ReturnValue::text("rendered"));
        match result {
            ResultEnvelope::Messages(messages) => {
                assert_eq!(messages[0].role, MessageRole::Assistant);
                assert_eq!(messages[0].content.as_text(), Some("rendered"));
            }
            other => panic!("unexpected envelope: {other:?}"),
        }
    }

    #[test]
    fn test_mime_type_splits_text_and_blob() {
        let text_b = binding(CallKind::Resource, ReturnShape::Text, Some("text/markdown"));
        match normalize(&text_b, ReturnValue::text("# hi")) {
            ResultEnvelope::Content(items) => {
                assert!(matches!(items[0], ContentItem::Text { .. }))
            }
            other => panic!("unexpected envelope: {other:?}"),
        }

        let blob_b = binding(CallKind::Resource, ReturnShape::Text, Some("image/png"));
        match normalize(&blob_b, ReturnValue::text("AAAA")) {
            ResultEnvelope::Content(items) => match &items[0] {
                ContentItem::Blob { mime_type, .. } => assert_eq!(mime_type, "image/png"),
                other => panic!("unexpected item: {other:?}"),
            },
            other => panic!("unexpected envelope: {other:?}"),
        }
    }

    #[test]
    fn test_text_list_without_mime_becomes_one_item_per_element() {
        let b = binding(CallKind::Tool, ReturnShape::TextList, None);
        match normalize(
            &b,
            ReturnValue::TextList(vec!["a".to_string(), "b".to_string()]),
        ) {
            ResultEnvelope::Content(items) => {
                assert_eq!(items.len(), 2);
                assert_eq!(items[1].as_text(), Some("b"));
            }
            other => panic!("unexpected envelope: {other:?}"),
        }
    }

    #[test]
    fn test_structured_where_supported_else_serialized_text() {
        let tool = binding(CallKind::Tool, ReturnShape::Structured, None);
        assert_eq!(
            normalize(&tool, ReturnValue::Structured(json!({"n": 8}))),
            ResultEnvelope::Structured(json!({"n": 8}))
        );

        let resource = binding(CallKind::Resource, ReturnShape::Structured, None);
        match normalize(&resource, ReturnValue::Structured(json!({"n": 8}))) {
            ResultEnvelope::Content(items) => {
                assert!(items[0].as_text().unwrap().contains("\"n\":8"));
            }
            other => panic!("unexpected envelope: {other:?}"),
        }
    }

    #[test]
    fn test_null_normalizes_to_neutral_not_error() {
        let list = binding(CallKind::Tool, ReturnShape::TextList, None);
        assert_eq!(
            normalize(&list, ReturnValue::Null),
            ResultEnvelope::Content(Vec::new())
        );

        let single = binding(CallKind::Tool, ReturnShape::Text, None);
        assert_eq!(
            normalize(&single, ReturnValue::Null).first_text(),
            Some("null")
        );

        let messages = binding(CallKind::Prompt, ReturnShape::MessageList, None);
        assert_eq!(
            normalize(&messages, ReturnValue::Null),
            ResultEnvelope::Messages(Vec::new())
        );
    }

    #[test]
    fn test_normalizing_twice_is_idempotent_on_equal_inputs() {
        let b = binding(CallKind::Tool, ReturnShape::Text, None);
        let a = normalize(&b, ReturnValue::text("same"));
        let c = normalize(&b, ReturnValue::text("same"));
        assert_eq!(a, c);
    }
}
