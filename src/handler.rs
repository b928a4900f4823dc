//! Handler construction and execution modes
//!
//! [`CallbackBuilder`] is the facade over the whole engine: it validates the
//! declared parameter list, return contract, and resource template once, at
//! `build()`, and produces a [`Handler`] that is cheap to clone and safe to
//! share across concurrent invocations.
//!
//! A handler runs in one of two modes, fixed at construction from the
//! declared return wrapper: blocking (resolution, invocation, and
//! normalization on the calling thread) or deferred (a lazy future; the
//! method runs only once the future is polled).
//!
//! # Example
//!
//! ```rust
//! use mcp_bind::{
//!     CallKind, CallScope, CallbackBuilder, IncomingRequest, ParamDecl, ReturnShape,
//!     ReturnValue, ValueShape, method_fn,
//! };
//!
//! let handler = CallbackBuilder::new(CallKind::Tool)
//!     .param(ParamDecl::arg("input", ValueShape::String))
//!     .returns(ReturnShape::Text)
//!     .method(method_fn(|args| {
//!         let input: String = args.named_as("input")?.unwrap_or_default();
//!         Ok(ReturnValue::text(input))
//!     }))
//!     .build()
//!     .expect("valid binding");
//!
//! let request = IncomingRequest::new("echo").arg("input", "hi");
//! let envelope = handler.call(CallScope::None, Some(&request)).unwrap();
//! assert_eq!(envelope.first_text(), Some("hi"));
//! ```

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::envelope::ResultEnvelope;
use crate::error::{BindResult, BindingError, CallResult};
use crate::invoke::{invoke_blocking, invoke_deferred};
use crate::kind::{CallKind, TransportMode};
use crate::method::Method;
use crate::normalize::normalize;
use crate::params::{classify, MethodBinding, ParamDecl, ReturnDecl, ReturnShape};
use crate::request::IncomingRequest;
use crate::resolve::resolve_args;
use crate::scope::CallScope;
use crate::template::UriTemplate;

/// The execution mode a handler was built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Everything runs synchronously on the calling thread.
    Blocking,
    /// The handler hands back a lazy future; the single await point is the
    /// caller's poll.
    Deferred,
}

/// A built handler: the immutable binding plus the bound method.
///
/// Cloning shares both; no per-call state lives here.
#[derive(Clone)]
pub struct Handler {
    binding: Arc<MethodBinding>,
    method: Arc<dyn Method>,
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handler")
            .field("binding", &self.binding)
            .finish_non_exhaustive()
    }
}

impl Handler {
    /// The shared binding descriptor.
    pub fn binding(&self) -> &Arc<MethodBinding> {
        &self.binding
    }

    /// The execution mode fixed at construction.
    pub fn mode(&self) -> ExecutionMode {
        match self.binding.returns().wrapper {
            crate::params::ReturnWrapper::None => ExecutionMode::Blocking,
            _ => ExecutionMode::Deferred,
        }
    }

    /// The JSON-Schema description of this handler's named arguments.
    pub fn argument_schema(&self) -> serde_json::Value {
        crate::schema::argument_schema(&self.binding)
    }

    /// Handle one invocation on the calling thread.
    ///
    /// `request: None` models a null protocol request and fails with
    /// "Request must not be null" before any resolution runs.
    pub fn call(
        &self,
        scope: CallScope,
        request: Option<&IncomingRequest>,
    ) -> CallResult<ResultEnvelope> {
        let result = resolve_args(&self.binding, &scope, request).and_then(|args| {
            let value = invoke_blocking(self.binding.kind(), self.method.as_ref(), args)?;
            Ok(normalize(&self.binding, value))
        });
        self.apply_error_policy(result)
    }

    /// Handle one invocation behind the deferred contract.
    ///
    /// The returned future is lazy: nothing runs until it is polled, not
    /// even the null-request check, and dropping it unpolled never invokes
    /// the method. A method that returns a ready value resolves
    /// without an extra scheduling hop.
    pub fn call_deferred(
        &self,
        scope: CallScope,
        request: Option<IncomingRequest>,
    ) -> BoxFuture<'static, CallResult<ResultEnvelope>> {
        let handler = self.clone();
        async move {
            let binding = &handler.binding;
            let result = match resolve_args(binding, &scope, request.as_ref()) {
                Ok(args) => {
                    invoke_deferred(
                        binding.kind(),
                        binding.returns().shape,
                        handler.method.as_ref(),
                        args,
                    )
                    .await
                    .map(|value| normalize(binding, value))
                }
                Err(e) => Err(e),
            };
            handler.apply_error_policy(result)
        }
        .boxed()
    }

    /// Context-free blocking entry point for notification kinds.
    pub fn notify(&self, payload: &IncomingRequest) -> CallResult<()> {
        self.call(CallScope::None, Some(payload)).map(|_| ())
    }

    /// Context-free deferred entry point for notification kinds.
    pub fn notify_deferred(&self, payload: IncomingRequest) -> BoxFuture<'static, CallResult<()>> {
        let fut = self.call_deferred(CallScope::None, Some(payload));
        async move { fut.await.map(|_| ()) }.boxed()
    }

    /// For call kinds whose envelope carries an error flag, fold conversion
    /// and invocation failures into the response. Resolution failures (null
    /// request, template mismatch) always propagate.
    fn apply_error_policy(
        &self,
        result: CallResult<ResultEnvelope>,
    ) -> CallResult<ResultEnvelope> {
        match result {
            Err(e) if self.binding.kind().flags_errors() && e.is_flaggable() => {
                tracing::warn!(
                    kind = %self.binding.kind(),
                    error = %e,
                    "Invocation failed; returning error-flagged result"
                );
                Ok(ResultEnvelope::error(e.to_string()))
            }
            other => other,
        }
    }
}

/// Builder that composes classification, validation, and the bound method
/// into a reusable [`Handler`]. All validation happens once, in
/// [`build`](Self::build); nothing is checked incrementally.
pub struct CallbackBuilder {
    kind: CallKind,
    transport: TransportMode,
    params: Vec<ParamDecl>,
    returns: Option<ReturnDecl>,
    mime_type: Option<String>,
    uri_template: Option<String>,
    method: Option<Arc<dyn Method>>,
}

impl CallbackBuilder {
    /// Start a builder for the given call kind (session transport by
    /// default).
    pub fn new(kind: CallKind) -> Self {
        Self {
            kind,
            transport: TransportMode::Session,
            params: Vec::new(),
            returns: None,
            mime_type: None,
            uri_template: None,
            method: None,
        }
    }

    /// Set the transport mode the handler will be installed into.
    pub fn transport(mut self, transport: TransportMode) -> Self {
        self.transport = transport;
        self
    }

    /// Declare one parameter.
    pub fn param(mut self, param: ParamDecl) -> Self {
        self.params.push(param);
        self
    }

    /// Declare several parameters at once.
    pub fn params(mut self, params: impl IntoIterator<Item = ParamDecl>) -> Self {
        self.params.extend(params);
        self
    }

    /// Declare a plain return shape.
    pub fn returns(mut self, shape: ReturnShape) -> Self {
        self.returns = Some(ReturnDecl::plain(shape));
        self
    }

    /// Declare a deferred return shape; the handler runs in deferred mode.
    pub fn returns_deferred(mut self, shape: ReturnShape) -> Self {
        self.returns = Some(ReturnDecl::deferred(shape));
        self
    }

    /// Declare a sequence of the given element shape; the handler runs in
    /// deferred mode and drains the sequence into a list.
    pub fn returns_sequence(mut self, shape: ReturnShape) -> Self {
        self.returns = Some(ReturnDecl::sequence(shape));
        self
    }

    /// Declare the result mime type (drives the text/blob split for plain
    /// string returns).
    pub fn mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Declare a resource location template. Placeholders must correspond
    /// 1:1 to named-argument parameters.
    pub fn uri_template(mut self, template: impl Into<String>) -> Self {
        self.uri_template = Some(template.into());
        self
    }

    /// Bind the user method.
    pub fn method(mut self, method: impl Method + 'static) -> Self {
        self.method = Some(Arc::new(method));
        self
    }

    /// Validate the whole declaration and build the handler.
    ///
    /// Failures here are fatal and never retried; a handler that fails to
    /// build is simply never installed.
    pub fn build(self) -> BindResult<Handler> {
        let method = self.method.ok_or(BindingError::MissingMethod)?;
        let returns = self.returns.ok_or(BindingError::MissingReturnShape)?;

        let roles = classify(self.kind, self.transport, &self.params)?;

        if !self.kind.accepts(&returns) {
            return Err(BindingError::UnsupportedReturnShape {
                kind: self.kind,
                shape: returns.shape,
                wrapper: returns.wrapper,
            });
        }

        let template = match self.uri_template {
            Some(template) => {
                if self.kind != CallKind::Resource {
                    return Err(BindingError::TemplateNotSupported { kind: self.kind });
                }
                let compiled = UriTemplate::compile(template)?;
                let names: Vec<&str> = roles
                    .iter()
                    .filter_map(|role| match role {
                        crate::params::ParameterRole::NamedArgument { name, .. } => {
                            Some(name.as_str())
                        }
                        _ => None,
                    })
                    .collect();
                compiled.check_correspondence(&names)?;
                Some(compiled)
            }
            None => None,
        };

        let binding = Arc::new(MethodBinding::new(
            self.kind,
            self.transport,
            roles,
            returns,
            self.mime_type,
            template,
        ));

        let mode = match returns.wrapper {
            crate::params::ReturnWrapper::None => ExecutionMode::Blocking,
            _ => ExecutionMode::Deferred,
        };
        tracing::debug!(
            kind = %binding.kind(),
            parameters = binding.roles().len(),
            mode = ?mode,
            "Built method binding"
        );

        Ok(Handler { binding, method })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CallError;
    use crate::method::{async_method_fn, method_fn, sequence_method_fn, ReturnValue};
    use crate::value::ValueShape;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn echo_handler() -> Handler {
        CallbackBuilder::new(CallKind::Tool)
            .param(ParamDecl::arg("input", ValueShape::String))
            .returns(ReturnShape::Text)
            .method(method_fn(|args| {
                let input: String = args.named_as("input")?.unwrap_or_default();
                Ok(ReturnValue::text(input))
            }))
            .build()
            .expect("valid binding")
    }

    #[test]
    fn test_build_requires_method_and_return_shape() {
        let err = CallbackBuilder::new(CallKind::Tool)
            .returns(ReturnShape::Text)
            .build()
            .unwrap_err();
        assert!(matches!(err, BindingError::MissingMethod));

        let err = CallbackBuilder::new(CallKind::Tool)
            .method(method_fn(|_| Ok(ReturnValue::Void)))
            .build()
            .unwrap_err();
        assert!(matches!(err, BindingError::MissingReturnShape));
    }

    #[test]
    fn test_unsupported_return_shape_fails_at_build() {
        let err = CallbackBuilder::new(CallKind::Prompt)
            .returns(ReturnShape::Structured)
            .method(method_fn(|_| Ok(ReturnValue::Void)))
            .build()
            .unwrap_err();
        assert!(matches!(err, BindingError::UnsupportedReturnShape { .. }));
    }

    #[test]
    fn test_template_on_non_resource_kind_is_rejected() {
        let err = CallbackBuilder::new(CallKind::Tool)
            .uri_template("x/{y}")
            .param(ParamDecl::arg("y", ValueShape::String))
            .returns(ReturnShape::Text)
            .method(method_fn(|_| Ok(ReturnValue::Void)))
            .build()
            .unwrap_err();
        assert!(matches!(err, BindingError::TemplateNotSupported { .. }));
    }

    #[test]
    fn test_template_correspondence_is_checked_at_build() {
        let err = CallbackBuilder::new(CallKind::Resource)
            .uri_template("users/{userId}/posts/{postId}")
            .param(ParamDecl::arg("userId", ValueShape::String))
            .returns(ReturnShape::Text)
            .method(method_fn(|_| Ok(ReturnValue::Void)))
            .build()
            .unwrap_err();
        assert!(matches!(err, BindingError::TemplateVariableMismatch { .. }));
    }

    #[test]
    fn test_blocking_call_round_trips() {
        let handler = echo_handler();
        assert_eq!(handler.mode(), ExecutionMode::Blocking);

        let request = IncomingRequest::new("echo").arg("input", "hi");
        let envelope = handler.call(CallScope::None, Some(&request)).unwrap();
        assert_eq!(envelope.first_text(), Some("hi"));
    }

    #[test]
    fn test_null_request_propagates_even_for_tools() {
        let handler = echo_handler();
        let err = handler.call(CallScope::None, None).unwrap_err();
        assert!(matches!(err, CallError::NullRequest));
    }

    #[test]
    fn test_tool_invocation_failure_is_error_flagged() {
        let handler = CallbackBuilder::new(CallKind::Tool)
            .returns(ReturnShape::Text)
            .method(method_fn(|_| Err("something broke".into())))
            .build()
            .unwrap();

        let request = IncomingRequest::new("fail");
        let envelope = handler.call(CallScope::None, Some(&request)).unwrap();
        assert!(envelope.is_error());
        assert!(envelope.first_text().unwrap().contains("something broke"));
    }

    #[test]
    fn test_prompt_invocation_failure_propagates() {
        let handler = CallbackBuilder::new(CallKind::Prompt)
            .returns(ReturnShape::Message)
            .method(method_fn(|_| Err("render failed".into())))
            .build()
            .unwrap();

        let request = IncomingRequest::new("fail");
        let err = handler.call(CallScope::None, Some(&request)).unwrap_err();
        assert!(matches!(err, CallError::Invocation { .. }));
    }

    #[test]
    fn test_tool_conversion_failure_is_error_flagged() {
        let handler = CallbackBuilder::new(CallKind::Tool)
            .param(ParamDecl::arg("n", ValueShape::Integer))
            .returns(ReturnShape::Text)
            .method(method_fn(|_| Ok(ReturnValue::text("unreached"))))
            .build()
            .unwrap();

        let request = IncomingRequest::new("conv").arg("n", "not a number");
        let envelope = handler.call(CallScope::None, Some(&request)).unwrap();
        assert!(envelope.is_error());
        assert!(envelope.first_text().unwrap().contains("integer"));
    }

    #[tokio::test]
    async fn test_deferred_call_is_lazy() {
        static INVOKED: AtomicUsize = AtomicUsize::new(0);

        let handler = CallbackBuilder::new(CallKind::Tool)
            .returns_deferred(ReturnShape::Text)
            .method(async_method_fn(|_| async {
                INVOKED.fetch_add(1, Ordering::SeqCst);
                Ok(ReturnValue::text("done"))
            }))
            .build()
            .unwrap();
        assert_eq!(handler.mode(), ExecutionMode::Deferred);

        let request = IncomingRequest::new("lazy");
        let fut = handler.call_deferred(CallScope::None, Some(request.clone()));
        assert_eq!(INVOKED.load(Ordering::SeqCst), 0);
        drop(fut);
        assert_eq!(INVOKED.load(Ordering::SeqCst), 0);

        let envelope = handler
            .call_deferred(CallScope::None, Some(request))
            .await
            .unwrap();
        assert_eq!(INVOKED.load(Ordering::SeqCst), 1);
        assert_eq!(envelope.first_text(), Some("done"));
    }

    #[tokio::test]
    async fn test_plain_method_works_behind_deferred_contract() {
        let handler = CallbackBuilder::new(CallKind::Tool)
            .returns_deferred(ReturnShape::Text)
            .method(method_fn(|_| Ok(ReturnValue::text("sync"))))
            .build()
            .unwrap();

        let envelope = handler
            .call_deferred(CallScope::None, Some(IncomingRequest::new("sync")))
            .await
            .unwrap();
        assert_eq!(envelope.first_text(), Some("sync"));
    }

    #[tokio::test]
    async fn test_sequence_handler_collects_into_list() {
        let handler = CallbackBuilder::new(CallKind::Tool)
            .returns_sequence(ReturnShape::Text)
            .method(sequence_method_fn(|_| {
                futures::stream::iter(vec![
                    Ok(ReturnValue::text("a")),
                    Ok(ReturnValue::text("b")),
                    Ok(ReturnValue::text("c")),
                ])
            }))
            .build()
            .unwrap();

        let envelope = handler
            .call_deferred(CallScope::None, Some(IncomingRequest::new("seq")))
            .await
            .unwrap();
        match envelope {
            ResultEnvelope::Content(items) => assert_eq!(items.len(), 3),
            other => panic!("unexpected envelope: {other:?}"),
        }
    }

    #[test]
    fn test_void_normalizes_to_done_in_blocking_mode() {
        let handler = CallbackBuilder::new(CallKind::Tool)
            .returns(ReturnShape::Void)
            .method(method_fn(|_| Ok(ReturnValue::Void)))
            .build()
            .unwrap();

        let envelope = handler
            .call(CallScope::None, Some(&IncomingRequest::new("void")))
            .unwrap();
        assert_eq!(envelope, ResultEnvelope::Done);
    }

    #[tokio::test]
    async fn test_void_normalizes_to_done_in_deferred_mode() {
        let handler = CallbackBuilder::new(CallKind::Tool)
            .returns_deferred(ReturnShape::Void)
            .method(async_method_fn(|_| async { Ok(ReturnValue::Void) }))
            .build()
            .unwrap();

        let envelope = handler
            .call_deferred(CallScope::None, Some(IncomingRequest::new("void")))
            .await
            .unwrap();
        assert_eq!(envelope, ResultEnvelope::Done);
    }

    #[test]
    fn test_notification_handler_is_context_free() {
        let handler = CallbackBuilder::new(CallKind::LoggingNotification)
            .param(ParamDecl::arguments_map())
            .returns(ReturnShape::Void)
            .method(method_fn(|args| {
                assert!(args.arguments().is_some());
                Ok(ReturnValue::Void)
            }))
            .build()
            .unwrap();

        let payload = IncomingRequest::new("log").arg("level", "info");
        handler.notify(&payload).unwrap();
    }
}
