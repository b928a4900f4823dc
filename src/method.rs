//! The bound method abstraction
//!
//! A [`Method`] is the user-written body behind a handler. It receives the
//! resolved [`Args`] and produces a [`MethodOutput`]: an immediately ready
//! value, a single deferred value, or a bounded sequence that the execution
//! adapter drains into a list. The free functions [`method_fn`],
//! [`async_method_fn`], and [`sequence_method_fn`] adapt plain closures.

use std::future::Future;

use futures::future::BoxFuture;
use futures::stream::BoxStream;
use futures::{FutureExt, Stream, StreamExt};
use serde::Serialize;
use serde_json::Value;

use crate::envelope::{MessageItem, ResultEnvelope};
use crate::error::BoxError;
use crate::resolve::Args;

/// The raw value a user method returns, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum ReturnValue {
    /// The call kind's native envelope, passed through unchanged.
    Envelope(ResultEnvelope),
    /// No value.
    Void,
    /// An explicit null; normalized to the shape's neutral representation.
    Null,
    /// A plain string.
    Text(String),
    /// A list of strings.
    TextList(Vec<String>),
    /// A single role-tagged message.
    Message(MessageItem),
    /// A list of role-tagged messages.
    Messages(Vec<MessageItem>),
    /// A structured JSON-like value.
    Structured(Value),
    /// A list of structured values.
    StructuredList(Vec<Value>),
}

impl ReturnValue {
    /// Serialize any value into a structured return via its `Serialize`
    /// impl, the object-to-JSON walk over public fields.
    pub fn from_serialize<T: Serialize>(value: &T) -> Result<Self, BoxError> {
        let value = serde_json::to_value(value)?;
        Ok(ReturnValue::Structured(value))
    }

    /// A plain text return.
    pub fn text(text: impl Into<String>) -> Self {
        ReturnValue::Text(text.into())
    }
}

/// How a method delivered its return value.
pub enum MethodOutput {
    /// The value is already available.
    Ready(Result<ReturnValue, BoxError>),
    /// A single deferred value, resolved when awaited.
    Deferred(BoxFuture<'static, Result<ReturnValue, BoxError>>),
    /// A bounded sequence of values, drained to completion and collected
    /// into a list before normalization.
    Sequence(BoxStream<'static, Result<ReturnValue, BoxError>>),
}

impl std::fmt::Debug for MethodOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MethodOutput::Ready(r) => f.debug_tuple("Ready").field(r).finish(),
            MethodOutput::Deferred(_) => f.write_str("Deferred(..)"),
            MethodOutput::Sequence(_) => f.write_str("Sequence(..)"),
        }
    }
}

/// A bound user method.
///
/// Implementations hold whatever receiver state they need; the engine only
/// requires that invocation is `Send + Sync` so one handler can serve
/// concurrent calls.
pub trait Method: Send + Sync {
    fn invoke(&self, args: Args) -> MethodOutput;
}

/// Adapt a blocking closure into a [`Method`].
pub fn method_fn<F>(f: F) -> impl Method
where
    F: Fn(Args) -> Result<ReturnValue, BoxError> + Send + Sync + 'static,
{
    FnMethod { f }
}

struct FnMethod<F> {
    f: F,
}

impl<F> Method for FnMethod<F>
where
    F: Fn(Args) -> Result<ReturnValue, BoxError> + Send + Sync + 'static,
{
    fn invoke(&self, args: Args) -> MethodOutput {
        MethodOutput::Ready((self.f)(args))
    }
}

/// Adapt an async closure into a [`Method`] producing a deferred value.
pub fn async_method_fn<F, Fut>(f: F) -> impl Method
where
    F: Fn(Args) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ReturnValue, BoxError>> + Send + 'static,
{
    AsyncFnMethod { f }
}

struct AsyncFnMethod<F> {
    f: F,
}

impl<F, Fut> Method for AsyncFnMethod<F>
where
    F: Fn(Args) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ReturnValue, BoxError>> + Send + 'static,
{
    fn invoke(&self, args: Args) -> MethodOutput {
        MethodOutput::Deferred((self.f)(args).boxed())
    }
}

/// Adapt a closure yielding a bounded stream into a [`Method`].
pub fn sequence_method_fn<F, St>(f: F) -> impl Method
where
    F: Fn(Args) -> St + Send + Sync + 'static,
    St: Stream<Item = Result<ReturnValue, BoxError>> + Send + 'static,
{
    SequenceFnMethod { f }
}

struct SequenceFnMethod<F> {
    f: F,
}

impl<F, St> Method for SequenceFnMethod<F>
where
    F: Fn(Args) -> St + Send + Sync + 'static,
    St: Stream<Item = Result<ReturnValue, BoxError>> + Send + 'static,
{
    fn invoke(&self, args: Args) -> MethodOutput {
        MethodOutput::Sequence((self.f)(args).boxed())
    }
}
