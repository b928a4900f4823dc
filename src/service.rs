//! Tower integration
//!
//! Handlers are plain callables, but hosts often want to compose them with
//! tower middleware (timeouts, concurrency limits, tracing). This module
//! adapts a [`Handler`] to a `tower_service::Service` over [`BoundRequest`]
//! and provides [`CatchError`], which converts service and middleware errors
//! into error-flagged envelopes so the boxed stack never fails at the tower
//! level.

use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tower::util::BoxCloneService;
use tower_service::Service;

use crate::envelope::ResultEnvelope;
use crate::error::CallError;
use crate::handler::Handler;
use crate::request::IncomingRequest;
use crate::scope::CallScope;

/// The request type for handler services: the call scope plus the optional
/// protocol request (absent models a null request).
#[derive(Debug, Clone)]
pub struct BoundRequest {
    pub scope: CallScope,
    pub request: Option<IncomingRequest>,
}

impl BoundRequest {
    pub fn new(scope: CallScope, request: IncomingRequest) -> Self {
        Self {
            scope,
            request: Some(request),
        }
    }
}

/// A boxed, cloneable handler service with `Error = Infallible`.
pub type BoxHandlerService = BoxCloneService<BoundRequest, ResultEnvelope, Infallible>;

/// Adapts a [`Handler`] to a tower `Service`.
///
/// The deferred call path serves both execution modes: a blocking method
/// behind it resolves without an extra scheduling hop.
#[derive(Clone)]
pub struct HandlerService {
    handler: Handler,
}

impl HandlerService {
    pub fn new(handler: Handler) -> Self {
        Self { handler }
    }
}

impl fmt::Debug for HandlerService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerService")
            .field("handler", &self.handler)
            .finish()
    }
}

impl Service<BoundRequest> for HandlerService {
    type Response = ResultEnvelope;
    type Error = CallError;
    type Future =
        Pin<Box<dyn Future<Output = std::result::Result<ResultEnvelope, CallError>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: BoundRequest) -> Self::Future {
        self.handler.call_deferred(req.scope, req.request)
    }
}

/// Catches errors from the inner service and converts them into
/// error-flagged envelopes.
///
/// Middleware errors (timeouts, limits) and propagated call errors all land
/// on the same error-flagged response path. Meant for call kinds whose
/// envelope carries the error flag; kinds that must propagate protocol
/// errors should use [`HandlerService`] directly.
pub struct CatchError<S> {
    inner: S,
}

impl<S> CatchError<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S: Clone> Clone for CatchError<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S: fmt::Debug> fmt::Debug for CatchError<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatchError").field("inner", &self.inner).finish()
    }
}

impl<S> Service<BoundRequest> for CatchError<S>
where
    S: Service<BoundRequest, Response = ResultEnvelope> + Clone + Send + 'static,
    S::Error: fmt::Display + Send,
    S::Future: Send,
{
    type Response = ResultEnvelope;
    type Error = Infallible;
    type Future =
        Pin<Box<dyn Future<Output = std::result::Result<ResultEnvelope, Infallible>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        match self.inner.poll_ready(cx) {
            Poll::Ready(Ok(())) => Poll::Ready(Ok(())),
            Poll::Ready(Err(_)) => Poll::Ready(Ok(())),
            Poll::Pending => Poll::Pending,
        }
    }

    fn call(&mut self, req: BoundRequest) -> Self::Future {
        let fut = self.inner.call(req);
        Box::pin(async move {
            match fut.await {
                Ok(envelope) => Ok(envelope),
                Err(err) => Ok(ResultEnvelope::error(err.to_string())),
            }
        })
    }
}

impl Handler {
    /// Expose this handler as a tower service.
    pub fn into_service(self) -> HandlerService {
        HandlerService::new(self)
    }

    /// Expose this handler as a boxed, never-failing service, with errors
    /// folded into error-flagged envelopes by [`CatchError`].
    pub fn into_boxed_service(self) -> BoxHandlerService {
        BoxCloneService::new(CatchError::new(HandlerService::new(self)))
    }
}
