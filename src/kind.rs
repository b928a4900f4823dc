//! Call kinds and transport modes
//!
//! A [`CallKind`] names one of the request/response families that share the
//! binding engine. Each kind fixes which return shapes a method may declare,
//! which envelope variants are legal, and how call-time failures surface
//! (error-flagged result vs. propagated error).

use crate::params::{ReturnDecl, ReturnShape, ReturnWrapper};

/// The request/response family a handler belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    /// Tool invocation (`tools/call`).
    Tool,
    /// Prompt rendering (`prompts/get`).
    Prompt,
    /// Resource reading (`resources/read`).
    Resource,
    /// Sampling request handling.
    Sampling,
    /// Elicitation response handling.
    Elicitation,
    /// Progress notification (no response expected).
    ProgressNotification,
    /// Logging notification (no response expected).
    LoggingNotification,
}

impl CallKind {
    /// Whether call-time conversion and invocation failures are folded into
    /// an error-flagged envelope instead of propagating.
    pub fn flags_errors(self) -> bool {
        matches!(self, CallKind::Tool)
    }

    /// Whether the envelope may carry a structured JSON payload.
    pub fn supports_structured(self) -> bool {
        matches!(self, CallKind::Tool | CallKind::Elicitation)
    }

    /// Whether results are role-tagged messages rather than bare content.
    pub fn message_envelope(self) -> bool {
        matches!(self, CallKind::Prompt | CallKind::Sampling)
    }

    /// Whether this kind is a fire-and-forget notification with no context
    /// parameter and no meaningful response body.
    pub fn is_notification(self) -> bool {
        matches!(
            self,
            CallKind::ProgressNotification | CallKind::LoggingNotification
        )
    }

    /// The plain return shapes a method of this kind may declare.
    fn plain_shapes(self) -> &'static [ReturnShape] {
        match self {
            CallKind::Tool => &[
                ReturnShape::Envelope,
                ReturnShape::Void,
                ReturnShape::Text,
                ReturnShape::TextList,
                ReturnShape::Structured,
                ReturnShape::StructuredList,
            ],
            CallKind::Prompt => &[
                ReturnShape::Envelope,
                ReturnShape::Void,
                ReturnShape::Text,
                ReturnShape::Message,
                ReturnShape::MessageList,
            ],
            CallKind::Resource => &[
                ReturnShape::Envelope,
                ReturnShape::Void,
                ReturnShape::Text,
                ReturnShape::TextList,
                ReturnShape::Structured,
            ],
            CallKind::Sampling => &[
                ReturnShape::Envelope,
                ReturnShape::Void,
                ReturnShape::Text,
                ReturnShape::Message,
            ],
            CallKind::Elicitation => &[
                ReturnShape::Envelope,
                ReturnShape::Void,
                ReturnShape::Structured,
            ],
            CallKind::ProgressNotification | CallKind::LoggingNotification => {
                &[ReturnShape::Void]
            }
        }
    }

    /// Whether a declared return shape (with its wrapper) is acceptable for
    /// this kind. The deferred wrapper is allowed around any accepted shape;
    /// a sequence is allowed when the element shape's list form is accepted.
    pub fn accepts(self, decl: &ReturnDecl) -> bool {
        match decl.wrapper {
            ReturnWrapper::None | ReturnWrapper::Deferred => {
                self.plain_shapes().contains(&decl.shape)
            }
            ReturnWrapper::Sequence => match decl.shape.list_form() {
                Some(list) => self.plain_shapes().contains(&list),
                None => false,
            },
        }
    }
}

impl std::fmt::Display for CallKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CallKind::Tool => "tool",
            CallKind::Prompt => "prompt",
            CallKind::Resource => "resource",
            CallKind::Sampling => "sampling",
            CallKind::Elicitation => "elicitation",
            CallKind::ProgressNotification => "progress notification",
            CallKind::LoggingNotification => "logging notification",
        };
        f.write_str(name)
    }
}

/// Transport mode the handler will be installed into.
///
/// Stateless transports cannot carry a session-bound exchange; bindings for
/// them must declare the context-only parameter type instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportMode {
    #[default]
    Session,
    Stateless,
}
