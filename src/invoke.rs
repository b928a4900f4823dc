//! Invocation with error isolation
//!
//! Calls the bound method and settles its output into a single raw
//! [`ReturnValue`]. Errors returned by the user's method body are rewrapped
//! as [`CallError::Invocation`] carrying the call kind and the original
//! cause, which keeps "the business logic failed" distinguishable from "the
//! binding layer failed".

use futures::StreamExt;

use crate::error::{CallError, CallResult};
use crate::kind::CallKind;
use crate::method::{Method, MethodOutput, ReturnValue};
use crate::params::ReturnShape;
use crate::resolve::Args;

pub(crate) fn user_error(kind: CallKind, source: crate::error::BoxError) -> CallError {
    CallError::Invocation { kind, source }
}

/// Invoke on the calling thread. Only a ready output is acceptable here; a
/// deferred or sequence output from a blocking binding is an invocation
/// error rather than a silent hang.
pub(crate) fn invoke_blocking(
    kind: CallKind,
    method: &dyn Method,
    args: Args,
) -> CallResult<ReturnValue> {
    match method.invoke(args) {
        MethodOutput::Ready(result) => result.map_err(|e| user_error(kind, e)),
        MethodOutput::Deferred(_) => Err(user_error(
            kind,
            "method produced a deferred value on the blocking call path".into(),
        )),
        MethodOutput::Sequence(_) => Err(user_error(
            kind,
            "method produced a value sequence on the blocking call path".into(),
        )),
    }
}

/// Invoke behind the deferred contract. A ready value is used where it
/// stands (no extra scheduling hop); a deferred value is awaited; a sequence
/// is drained to completion and folded into the declared element shape's
/// list form.
pub(crate) async fn invoke_deferred(
    kind: CallKind,
    element_shape: ReturnShape,
    method: &dyn Method,
    args: Args,
) -> CallResult<ReturnValue> {
    match method.invoke(args) {
        MethodOutput::Ready(result) => result.map_err(|e| user_error(kind, e)),
        MethodOutput::Deferred(fut) => fut.await.map_err(|e| user_error(kind, e)),
        MethodOutput::Sequence(mut stream) => {
            let mut items = Vec::new();
            while let Some(item) = stream.next().await {
                items.push(item.map_err(|e| user_error(kind, e))?);
            }
            fold_sequence(kind, element_shape, items)
        }
    }
}

/// Collect drained sequence elements into the declared shape's list form.
fn fold_sequence(
    kind: CallKind,
    element_shape: ReturnShape,
    items: Vec<ReturnValue>,
) -> CallResult<ReturnValue> {
    match element_shape {
        ReturnShape::Text => {
            let mut texts = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    ReturnValue::Text(s) => texts.push(s),
                    other => return Err(element_mismatch(kind, element_shape, &other)),
                }
            }
            Ok(ReturnValue::TextList(texts))
        }
        ReturnShape::Message => {
            let mut messages = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    ReturnValue::Message(m) => messages.push(m),
                    other => return Err(element_mismatch(kind, element_shape, &other)),
                }
            }
            Ok(ReturnValue::Messages(messages))
        }
        ReturnShape::Structured => {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    ReturnValue::Structured(v) => values.push(v),
                    other => return Err(element_mismatch(kind, element_shape, &other)),
                }
            }
            Ok(ReturnValue::StructuredList(values))
        }
        other => Err(user_error(
            kind,
            format!("sequence bindings cannot declare element shape {other:?}").into(),
        )),
    }
}

fn element_mismatch(kind: CallKind, expected: ReturnShape, got: &ReturnValue) -> CallError {
    user_error(
        kind,
        format!("sequence element does not match declared shape {expected:?}: {got:?}").into(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::kind::TransportMode;
    use crate::method::{async_method_fn, method_fn, sequence_method_fn};
    use crate::params::{MethodBinding, ReturnDecl};

    fn args() -> Args {
        let binding = Arc::new(MethodBinding::new(
            CallKind::Tool,
            TransportMode::Session,
            Vec::new(),
            ReturnDecl::plain(ReturnShape::Text),
            None,
            None,
        ));
        Args::new(binding, Vec::new())
    }

    #[test]
    fn test_blocking_wraps_user_failure_with_kind_and_cause() {
        let method = method_fn(|_| Err("kaboom".into()));
        let err = invoke_blocking(CallKind::Tool, &method, args()).unwrap_err();
        assert!(err.to_string().contains("tool method failed"));
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "kaboom");
    }

    #[test]
    fn test_blocking_rejects_deferred_output() {
        let method = async_method_fn(|_| async { Ok(ReturnValue::Void) });
        let err = invoke_blocking(CallKind::Tool, &method, args()).unwrap_err();
        assert!(err.to_string().contains("deferred value"));
    }

    #[tokio::test]
    async fn test_deferred_uses_ready_value_in_place() {
        let method = method_fn(|_| Ok(ReturnValue::text("sync behind async")));
        let value = invoke_deferred(CallKind::Tool, ReturnShape::Text, &method, args())
            .await
            .unwrap();
        assert_eq!(value, ReturnValue::text("sync behind async"));
    }

    #[tokio::test]
    async fn test_sequence_drains_and_folds_to_text_list() {
        let method = sequence_method_fn(|_| {
            futures::stream::iter(vec![
                Ok(ReturnValue::text("one")),
                Ok(ReturnValue::text("two")),
            ])
        });
        let value = invoke_deferred(CallKind::Tool, ReturnShape::Text, &method, args())
            .await
            .unwrap();
        assert_eq!(
            value,
            ReturnValue::TextList(vec!["one".to_string(), "two".to_string()])
        );
    }

    #[tokio::test]
    async fn test_sequence_element_error_stops_the_drain() {
        let method = sequence_method_fn(|_| {
            futures::stream::iter(vec![Ok(ReturnValue::text("ok")), Err("broke".into())])
        });
        let err = invoke_deferred(CallKind::Tool, ReturnShape::Text, &method, args())
            .await
            .unwrap_err();
        assert!(matches!(err, CallError::Invocation { .. }));
    }

    #[tokio::test]
    async fn test_sequence_element_shape_mismatch_is_invocation_error() {
        let method = sequence_method_fn(|_| {
            futures::stream::iter(vec![Ok(ReturnValue::Structured(serde_json::json!(1)))])
        });
        let err = invoke_deferred(CallKind::Tool, ReturnShape::Text, &method, args())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("does not match declared shape"));
    }
}
