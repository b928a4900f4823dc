//! Error types for mcp-bind
//!
//! Two separate taxonomies: [`BindingError`] for handler construction and
//! [`CallError`] for individual invocations. A construction failure is fatal
//! and never retried; the handler is simply never built. Call failures either
//! propagate to the caller or, for call kinds whose envelope carries an error
//! flag, are folded into the response (see [`crate::handler::Handler`]).

use serde_json::Value;

use crate::kind::CallKind;
use crate::params::{ReturnShape, ReturnWrapper};

/// A type-erased error, used as the user method's error channel.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while building a handler.
///
/// These surface from [`crate::handler::CallbackBuilder::build`] and indicate
/// a malformed binding declaration: bad role cardinality, an unsupported
/// return shape, or a URI template that does not line up with the declared
/// arguments.
#[derive(Debug, thiserror::Error)]
pub enum BindingError {
    /// A role that permits at most one parameter was declared twice.
    #[error("cannot have more than one {role} parameter: `{name}` at position {position}")]
    DuplicateRole {
        /// Human-readable role name (e.g. "metadata", "arguments map").
        role: &'static str,
        name: String,
        position: usize,
    },

    /// A session-bound exchange parameter was declared on a stateless transport.
    #[error(
        "session exchange parameter `{name}` at position {position} is not available on a \
         stateless transport; declare a client context parameter instead"
    )]
    ExchangeNotSupported { name: String, position: usize },

    /// A notification handler declared an exchange or context parameter.
    #[error("{kind} handlers are context-free and cannot declare parameter `{name}` at position {position}")]
    ContextNotSupported {
        kind: CallKind,
        name: String,
        position: usize,
    },

    /// The declared return shape is outside the call kind's accepted set.
    #[error("return shape {shape:?} ({wrapper:?}) is not supported for {kind} handlers")]
    UnsupportedReturnShape {
        kind: CallKind,
        shape: ReturnShape,
        wrapper: ReturnWrapper,
    },

    /// Template placeholders and named-argument parameters do not correspond 1:1.
    #[error(
        "uri template `{template}` does not line up with the declared arguments: \
         placeholders without a parameter [{missing}], parameters without a placeholder [{unmatched}]"
    )]
    TemplateVariableMismatch {
        template: String,
        missing: String,
        unmatched: String,
    },

    /// A URI template was supplied for a call kind other than resource reads.
    #[error("uri templates only apply to resource handlers, not {kind} handlers")]
    TemplateNotSupported { kind: CallKind },

    /// The template itself is malformed (e.g. an empty `{}` placeholder).
    #[error("invalid uri template `{template}`: {reason}")]
    InvalidTemplate { template: String, reason: String },

    /// `build()` was called without a bound method.
    #[error("no method bound; call CallbackBuilder::method before build")]
    MissingMethod,

    /// `build()` was called without a declared return shape.
    #[error("no return shape declared; call CallbackBuilder::returns before build")]
    MissingReturnShape,
}

/// Errors raised while handling one invocation.
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    /// The caller supplied no protocol request. Checked before any other
    /// resolution proceeds.
    #[error("Request must not be null")]
    NullRequest,

    /// The incoming location does not match the binding's URI template.
    #[error("uri `{uri}` does not match template `{template}`")]
    TemplateMismatch { template: String, uri: String },

    /// A named-argument value could not be coerced to its declared shape.
    #[error("cannot convert argument `{argument}` to {expected}: got {value}")]
    Conversion {
        argument: String,
        expected: String,
        value: Value,
    },

    /// The user's method body failed. The original cause is preserved.
    #[error("{kind} method failed: {source}")]
    Invocation {
        kind: CallKind,
        #[source]
        source: BoxError,
    },
}

impl CallError {
    /// Whether this error may be folded into an error-flagged envelope for
    /// call kinds that support one. Resolution failures never are.
    pub fn is_flaggable(&self) -> bool {
        matches!(
            self,
            CallError::Conversion { .. } | CallError::Invocation { .. }
        )
    }
}

/// Result alias for handler construction.
pub type BindResult<T> = std::result::Result<T, BindingError>;

/// Result alias for invocations.
pub type CallResult<T> = std::result::Result<T, CallError>;
