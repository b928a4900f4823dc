//! Parameter declarations, role classification, and the method binding
//!
//! A bound method declares its parameters as an ordered list of
//! [`ParamDecl`]s. Classification runs once, at construction time, and maps
//! every declared parameter to exactly one [`ParameterRole`] by a fixed
//! priority: exchange/context type, protocol-request type, metadata marker
//! or bag type, progress marker, generic argument map, and finally a named
//! argument. The result is cached in an immutable [`MethodBinding`] shared
//! across all invocations of the handler.

use crate::error::{BindResult, BindingError};
use crate::kind::{CallKind, TransportMode};
use crate::template::UriTemplate;
use crate::value::ValueShape;

/// The declared type identity of one parameter.
#[derive(Debug, Clone)]
pub enum ParamType {
    /// The session-bound exchange type.
    Exchange,
    /// The context-only type for stateless transports.
    Context,
    /// The call kind's protocol-request type.
    Request,
    /// The metadata bag type.
    Meta,
    /// A generic string-keyed map of all named arguments.
    ArgumentsMap,
    /// Any other value, described by its shape.
    Value(ValueShape),
}

/// A parameter-level marker, the counterpart of an annotation.
#[derive(Debug, Clone)]
pub enum Marker {
    /// Marks the parameter as the metadata accessor.
    Meta,
    /// Marks the parameter as the progress token.
    Progress,
    /// Marks the parameter as an externally visible named argument.
    Arg {
        /// Exposed name; the declared parameter name is used when absent.
        name: Option<String>,
        required: bool,
    },
}

/// One declared parameter: a name, a type identity, and an optional marker.
#[derive(Debug, Clone)]
pub struct ParamDecl {
    name: String,
    ty: ParamType,
    marker: Option<Marker>,
}

impl ParamDecl {
    /// A parameter with an explicit name and type.
    pub fn new(name: impl Into<String>, ty: ParamType) -> Self {
        Self {
            name: name.into(),
            ty,
            marker: None,
        }
    }

    /// A session-bound exchange parameter.
    pub fn exchange() -> Self {
        Self::new("exchange", ParamType::Exchange)
    }

    /// A stateless client-context parameter.
    pub fn context() -> Self {
        Self::new("context", ParamType::Context)
    }

    /// The raw protocol-request parameter.
    pub fn request() -> Self {
        Self::new("request", ParamType::Request)
    }

    /// The metadata accessor parameter.
    pub fn meta() -> Self {
        Self::new("meta", ParamType::Meta)
    }

    /// The progress-token parameter.
    pub fn progress() -> Self {
        Self {
            name: "progress_token".to_string(),
            ty: ParamType::Value(ValueShape::Any),
            marker: Some(Marker::Progress),
        }
    }

    /// The generic arguments-map parameter.
    pub fn arguments_map() -> Self {
        Self::new("arguments", ParamType::ArgumentsMap)
    }

    /// A named argument with the given shape, required by default.
    pub fn arg(name: impl Into<String>, shape: ValueShape) -> Self {
        let name = name.into();
        Self {
            name,
            ty: ParamType::Value(shape),
            marker: Some(Marker::Arg {
                name: None,
                required: true,
            }),
        }
    }

    /// Mark a named argument optional.
    pub fn optional(mut self) -> Self {
        if let Some(Marker::Arg { required, .. }) = &mut self.marker {
            *required = false;
        } else {
            self.marker = Some(Marker::Arg {
                name: None,
                required: false,
            });
        }
        self
    }

    /// Expose a named argument under a different external name.
    pub fn exposed_as(mut self, exposed: impl Into<String>) -> Self {
        let exposed = exposed.into();
        match &mut self.marker {
            Some(Marker::Arg { name, .. }) => *name = Some(exposed),
            _ => {
                self.marker = Some(Marker::Arg {
                    name: Some(exposed),
                    required: true,
                });
            }
        }
        self
    }

    /// Attach an explicit marker.
    pub fn with_marker(mut self, marker: Marker) -> Self {
        self.marker = Some(marker);
        self
    }

    /// The declared parameter name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// The semantic role assigned to one parameter.
#[derive(Debug, Clone)]
pub enum ParameterRole {
    /// Receives the call site's exchange or context object verbatim.
    ExchangeOrContext,
    /// Receives the raw protocol request verbatim.
    ProtocolRequest,
    /// Receives one named argument, coerced to its declared shape.
    NamedArgument {
        name: String,
        shape: ValueShape,
        required: bool,
    },
    /// Receives the whole named-argument map.
    ArgumentsMap,
    /// Receives the metadata accessor (empty when the request has none).
    Metadata,
    /// Receives the optional progress token.
    ProgressToken,
}

impl ParameterRole {
    /// The human-readable role name used in cardinality diagnostics.
    pub fn role_name(&self) -> &'static str {
        match self {
            ParameterRole::ExchangeOrContext => "exchange or context",
            ParameterRole::ProtocolRequest => "protocol request",
            ParameterRole::NamedArgument { .. } => "named argument",
            ParameterRole::ArgumentsMap => "arguments map",
            ParameterRole::Metadata => "metadata",
            ParameterRole::ProgressToken => "progress token",
        }
    }
}

/// Assign every declared parameter exactly one role, validating cardinality
/// and transport constraints. Runs once per handler, at construction.
pub fn classify(
    kind: CallKind,
    transport: TransportMode,
    params: &[ParamDecl],
) -> BindResult<Vec<ParameterRole>> {
    let mut roles = Vec::with_capacity(params.len());
    let mut seen_scope = false;
    let mut seen_request = false;
    let mut seen_meta = false;
    let mut seen_progress = false;
    let mut seen_args_map = false;

    for (position, param) in params.iter().enumerate() {
        let role = match (&param.ty, &param.marker) {
            (ParamType::Exchange | ParamType::Context, _) => {
                if kind.is_notification() {
                    return Err(BindingError::ContextNotSupported {
                        kind,
                        name: param.name.clone(),
                        position,
                    });
                }
                if matches!(param.ty, ParamType::Exchange)
                    && transport == TransportMode::Stateless
                {
                    return Err(BindingError::ExchangeNotSupported {
                        name: param.name.clone(),
                        position,
                    });
                }
                if std::mem::replace(&mut seen_scope, true) {
                    return Err(duplicate(ParameterRole::ExchangeOrContext, param, position));
                }
                ParameterRole::ExchangeOrContext
            }
            (ParamType::Request, _) => {
                if std::mem::replace(&mut seen_request, true) {
                    return Err(duplicate(ParameterRole::ProtocolRequest, param, position));
                }
                ParameterRole::ProtocolRequest
            }
            (ParamType::Meta, _) | (_, Some(Marker::Meta)) => {
                if std::mem::replace(&mut seen_meta, true) {
                    return Err(duplicate(ParameterRole::Metadata, param, position));
                }
                ParameterRole::Metadata
            }
            (_, Some(Marker::Progress)) => {
                if std::mem::replace(&mut seen_progress, true) {
                    return Err(duplicate(ParameterRole::ProgressToken, param, position));
                }
                ParameterRole::ProgressToken
            }
            (ParamType::ArgumentsMap, _) => {
                if std::mem::replace(&mut seen_args_map, true) {
                    return Err(duplicate(ParameterRole::ArgumentsMap, param, position));
                }
                ParameterRole::ArgumentsMap
            }
            (ParamType::Value(shape), marker) => {
                let (name, required) = match marker {
                    Some(Marker::Arg { name, required }) => (
                        name.clone().unwrap_or_else(|| param.name.clone()),
                        *required,
                    ),
                    _ => (param.name.clone(), true),
                };
                ParameterRole::NamedArgument {
                    name,
                    shape: shape.clone(),
                    required,
                }
            }
        };
        roles.push(role);
    }

    Ok(roles)
}

fn duplicate(role: ParameterRole, param: &ParamDecl, position: usize) -> BindingError {
    BindingError::DuplicateRole {
        role: role.role_name(),
        name: param.name.clone(),
        position,
    }
}

/// The shape a method declares for its return value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnShape {
    /// The call kind's native result envelope, passed through unchanged.
    Envelope,
    /// No value; normalized to the `"Done"` sentinel.
    Void,
    /// A plain string.
    Text,
    /// A list of strings.
    TextList,
    /// A single role-tagged message.
    Message,
    /// A list of role-tagged messages.
    MessageList,
    /// A structured JSON-like value.
    Structured,
    /// A list of structured values.
    StructuredList,
}

impl ReturnShape {
    /// The list shape that collecting a sequence of this shape produces.
    pub fn list_form(self) -> Option<ReturnShape> {
        match self {
            ReturnShape::Text => Some(ReturnShape::TextList),
            ReturnShape::Message => Some(ReturnShape::MessageList),
            ReturnShape::Structured => Some(ReturnShape::StructuredList),
            _ => None,
        }
    }
}

/// How the declared return value is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnWrapper {
    /// A plain value, handled on the calling thread.
    None,
    /// A single deferred value; the handler runs in deferred mode.
    Deferred,
    /// A bounded sequence, drained into a list before normalization.
    Sequence,
}

/// The declared return contract: a shape plus its delivery wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReturnDecl {
    pub shape: ReturnShape,
    pub wrapper: ReturnWrapper,
}

impl ReturnDecl {
    pub fn plain(shape: ReturnShape) -> Self {
        Self {
            shape,
            wrapper: ReturnWrapper::None,
        }
    }

    pub fn deferred(shape: ReturnShape) -> Self {
        Self {
            shape,
            wrapper: ReturnWrapper::Deferred,
        }
    }

    pub fn sequence(shape: ReturnShape) -> Self {
        Self {
            shape,
            wrapper: ReturnWrapper::Sequence,
        }
    }
}

/// Immutable record of one bound method: call kind, transport mode, the
/// classified role list, the declared return contract, and the resource
/// template and mime type where the kind uses them.
///
/// Created once at handler construction, shared read-only across all
/// invocations; holds no per-call state.
#[derive(Debug, Clone)]
pub struct MethodBinding {
    kind: CallKind,
    transport: TransportMode,
    roles: Vec<ParameterRole>,
    returns: ReturnDecl,
    mime_type: Option<String>,
    template: Option<UriTemplate>,
}

impl MethodBinding {
    pub(crate) fn new(
        kind: CallKind,
        transport: TransportMode,
        roles: Vec<ParameterRole>,
        returns: ReturnDecl,
        mime_type: Option<String>,
        template: Option<UriTemplate>,
    ) -> Self {
        Self {
            kind,
            transport,
            roles,
            returns,
            mime_type,
            template,
        }
    }

    pub fn kind(&self) -> CallKind {
        self.kind
    }

    pub fn transport(&self) -> TransportMode {
        self.transport
    }

    pub fn roles(&self) -> &[ParameterRole] {
        &self.roles
    }

    pub fn returns(&self) -> ReturnDecl {
        self.returns
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    pub fn template(&self) -> Option<&UriTemplate> {
        self.template.as_ref()
    }

    /// The named-argument roles, in declared order.
    pub fn named_arguments(&self) -> impl Iterator<Item = (&str, &ValueShape, bool)> {
        self.roles.iter().filter_map(|role| match role {
            ParameterRole::NamedArgument {
                name,
                shape,
                required,
            } => Some((name.as_str(), shape, *required)),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_assigns_every_parameter() {
        let params = vec![
            ParamDecl::exchange(),
            ParamDecl::request(),
            ParamDecl::meta(),
            ParamDecl::progress(),
            ParamDecl::arguments_map(),
            ParamDecl::arg("query", ValueShape::String),
        ];
        let roles = classify(CallKind::Tool, TransportMode::Session, &params).unwrap();

        assert_eq!(roles.len(), 6);
        assert!(matches!(roles[0], ParameterRole::ExchangeOrContext));
        assert!(matches!(roles[1], ParameterRole::ProtocolRequest));
        assert!(matches!(roles[2], ParameterRole::Metadata));
        assert!(matches!(roles[3], ParameterRole::ProgressToken));
        assert!(matches!(roles[4], ParameterRole::ArgumentsMap));
        assert!(matches!(
            roles[5],
            ParameterRole::NamedArgument { ref name, required: true, .. } if name == "query"
        ));
    }

    #[test]
    fn test_duplicate_metadata_is_rejected_by_name() {
        let params = vec![ParamDecl::meta(), ParamDecl::meta()];
        let err = classify(CallKind::Tool, TransportMode::Session, &params).unwrap_err();
        let message = err.to_string();
        assert!(
            message.contains("cannot have more than one metadata parameter"),
            "unexpected message: {message}"
        );
        assert!(message.contains("position 1"));
    }

    #[test]
    fn test_duplicate_scope_request_map_and_progress_are_rejected() {
        for params in [
            vec![ParamDecl::exchange(), ParamDecl::exchange()],
            vec![ParamDecl::request(), ParamDecl::request()],
            vec![ParamDecl::arguments_map(), ParamDecl::arguments_map()],
            vec![ParamDecl::progress(), ParamDecl::progress()],
        ] {
            let err = classify(CallKind::Tool, TransportMode::Session, &params).unwrap_err();
            assert!(matches!(err, BindingError::DuplicateRole { .. }));
        }
    }

    #[test]
    fn test_stateless_transport_rejects_exchange_with_named_error() {
        let params = vec![ParamDecl::exchange()];
        let err = classify(CallKind::Tool, TransportMode::Stateless, &params).unwrap_err();
        assert!(matches!(err, BindingError::ExchangeNotSupported { .. }));

        // The context-only type is fine.
        let params = vec![ParamDecl::context()];
        assert!(classify(CallKind::Tool, TransportMode::Stateless, &params).is_ok());
    }

    #[test]
    fn test_notifications_reject_scope_parameters() {
        let params = vec![ParamDecl::context()];
        let err =
            classify(CallKind::ProgressNotification, TransportMode::Session, &params).unwrap_err();
        assert!(matches!(err, BindingError::ContextNotSupported { .. }));
    }

    #[test]
    fn test_arg_marker_overrides_exposed_name_and_required() {
        let params = vec![
            ParamDecl::arg("user_id", ValueShape::String).exposed_as("userId"),
            ParamDecl::arg("limit", ValueShape::Integer).optional(),
        ];
        let roles = classify(CallKind::Tool, TransportMode::Session, &params).unwrap();

        assert!(matches!(
            &roles[0],
            ParameterRole::NamedArgument { name, required: true, .. } if name == "userId"
        ));
        assert!(matches!(
            &roles[1],
            ParameterRole::NamedArgument { name, required: false, .. } if name == "limit"
        ));
    }

    #[test]
    fn test_map_type_wins_over_arg_marker() {
        // Rule order: the generic map rule is more specific than the named
        // argument fallback, marker or not.
        let params = vec![ParamDecl::arguments_map().with_marker(Marker::Arg {
            name: Some("ignored".to_string()),
            required: true,
        })];
        let roles = classify(CallKind::Tool, TransportMode::Session, &params).unwrap();
        assert!(matches!(roles[0], ParameterRole::ArgumentsMap));
    }

    #[test]
    fn test_unmarked_value_parameter_defaults_to_required_named_argument() {
        let params = vec![ParamDecl::new("input", ParamType::Value(ValueShape::Any))];
        let roles = classify(CallKind::Tool, TransportMode::Session, &params).unwrap();
        assert!(matches!(
            &roles[0],
            ParameterRole::NamedArgument { name, required: true, .. } if name == "input"
        ));
    }
}
