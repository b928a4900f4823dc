//! # mcp-bind
//!
//! A method binding engine for Model Context Protocol handlers.
//!
//! This crate turns an arbitrary user-written method, with a heterogeneous,
//! order-independent parameter list and a variety of possible return shapes,
//! into the uniform request/response handler a host protocol runtime expects.
//! The same engine serves every call kind: tool invocation, prompt rendering,
//! resource reading, sampling, elicitation, and progress/logging
//! notifications. Each kind differs only in its request type and result
//! envelope; the underlying problem is identical, so the machinery is shared.
//!
//! ## How a binding works
//!
//! 1. **Classify once.** At construction time, every declared parameter is
//!    assigned exactly one semantic role (exchange/context, protocol request,
//!    named argument, arguments map, metadata, progress token) and the
//!    declared return shape is checked against the call kind's accepted set.
//!    The result is an immutable [`MethodBinding`] cached for the handler's
//!    lifetime.
//! 2. **Resolve per call.** Each invocation binds the incoming request to the
//!    ordered argument list: context objects verbatim, named arguments
//!    coerced to their declared shapes, metadata always present (empty when
//!    the request carries none), missing arguments resolved to absent rather
//!    than rejected.
//! 3. **Invoke and normalize.** The bound method runs with user errors
//!    isolated from binding errors, and whatever it returns is normalized
//!    into the kind's [`ResultEnvelope`], including the `"Done"` sentinel
//!    for void methods so results are never empty on the wire.
//!
//! ## Example
//!
//! ```rust
//! use mcp_bind::{
//!     CallKind, CallScope, CallbackBuilder, IncomingRequest, ParamDecl, ReturnShape,
//!     ReturnValue, ValueShape, method_fn,
//! };
//!
//! let handler = CallbackBuilder::new(CallKind::Tool)
//!     .param(ParamDecl::arg("a", ValueShape::Integer))
//!     .param(ParamDecl::arg("b", ValueShape::Integer))
//!     .returns(ReturnShape::Text)
//!     .method(method_fn(|args| {
//!         let a: i64 = args.named_as("a")?.unwrap_or_default();
//!         let b: i64 = args.named_as("b")?.unwrap_or_default();
//!         Ok(ReturnValue::text((a + b).to_string()))
//!     }))
//!     .build()?;
//!
//! let request = IncomingRequest::new("add").arg("a", 5).arg("b", 3);
//! let envelope = handler.call(CallScope::None, Some(&request))?;
//! assert_eq!(envelope.first_text(), Some("8"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Execution modes
//!
//! A handler's mode is fixed at construction from the declared return
//! wrapper. Blocking handlers run everything on the calling thread. Deferred
//! handlers ([`CallbackBuilder::returns_deferred`] or
//! [`CallbackBuilder::returns_sequence`]) hand back a lazy future: the method
//! runs only once the future is polled, a plain-valued method resolves
//! without an extra scheduling hop, and a bounded sequence is drained into a
//! list before normalization. Dropping the future before completion prevents
//! delivery; no cooperative cancellation reaches user code.
//!
//! ## Errors
//!
//! Construction problems are [`BindingError`]s: fatal, raised once from
//! [`CallbackBuilder::build`], never retried. Call-time problems are
//! [`CallError`]s; for tool handlers, conversion and invocation failures are
//! folded into an error-flagged envelope (`isError: true`) instead of
//! propagating, while structurally invalid requests (a null request, a
//! location that does not match the resource template) always propagate.
//!
//! ## Tower integration
//!
//! [`Handler::into_service`] adapts a handler to a
//! [`tower_service::Service`], so standard middleware (timeouts, limits,
//! tracing) composes the usual way; [`Handler::into_boxed_service`] adds the
//! catch-error wrapper that converts middleware failures into error-flagged
//! envelopes.

pub mod envelope;
pub mod error;
pub mod handler;
pub mod invoke;
pub mod kind;
pub mod method;
pub mod normalize;
pub mod params;
pub mod request;
pub mod resolve;
pub mod schema;
pub mod scope;
pub mod service;
pub mod template;
pub mod value;

// Re-exports
pub use envelope::{ContentItem, MessageItem, MessageRole, ResultEnvelope};
pub use error::{BindResult, BindingError, BoxError, CallError, CallResult};
pub use handler::{CallbackBuilder, ExecutionMode, Handler};
pub use kind::{CallKind, TransportMode};
pub use method::{
    async_method_fn, method_fn, sequence_method_fn, Method, MethodOutput, ReturnValue,
};
pub use normalize::normalize;
pub use params::{
    classify, Marker, MethodBinding, ParamDecl, ParamType, ParameterRole, ReturnDecl,
    ReturnShape, ReturnWrapper,
};
pub use request::{IncomingRequest, Meta, ProgressToken};
pub use resolve::{resolve_args, ArgValue, Args};
pub use schema::argument_schema;
pub use scope::{CallScope, ClientContext, Exchange, Extensions};
pub use service::{BoundRequest, BoxHandlerService, CatchError, HandlerService};
pub use template::UriTemplate;
pub use value::{coerce, CoercionFailure, TypedShape, ValueShape};
