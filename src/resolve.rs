//! Per-call argument resolution
//!
//! Given a classified [`MethodBinding`] and an incoming request, produce the
//! ordered argument list the bound method is invoked with. The null-request
//! check runs before anything else; everything after it resolves in declared
//! parameter order. Each invocation owns its own [`Args`]; nothing here is
//! shared between concurrent calls.

use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{CallError, CallResult};
use crate::params::{MethodBinding, ParameterRole};
use crate::request::{IncomingRequest, Meta, ProgressToken};
use crate::scope::CallScope;
use crate::value::coerce;

/// One resolved argument, in declared parameter order.
#[derive(Debug, Clone)]
pub enum ArgValue {
    /// The call site's exchange or context, verbatim.
    Scope(CallScope),
    /// The incoming protocol request, verbatim.
    Request(IncomingRequest),
    /// The metadata accessor; empty when the request carried none.
    Meta(Meta),
    /// The progress token, absent when the client sent none.
    Progress(Option<ProgressToken>),
    /// The whole named-argument map.
    ArgumentsMap(Map<String, Value>),
    /// One named argument; `None` when the request did not supply it
    /// (required or not; requiredness is enforced upstream by schema
    /// validation, not here).
    Named(Option<Value>),
}

/// The ordered argument list for one invocation.
///
/// Positional access mirrors the declared parameter order; the named-argument
/// accessors look values up by their exposed name via the shared binding.
#[derive(Debug, Clone)]
pub struct Args {
    binding: Arc<MethodBinding>,
    values: Vec<ArgValue>,
}

impl Args {
    pub(crate) fn new(binding: Arc<MethodBinding>, values: Vec<ArgValue>) -> Self {
        Self { binding, values }
    }

    /// Number of resolved arguments (equals the declared parameter count).
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The argument at the given declared position.
    pub fn get(&self, position: usize) -> Option<&ArgValue> {
        self.values.get(position)
    }

    /// The binding these arguments were resolved against.
    pub fn binding(&self) -> &MethodBinding {
        &self.binding
    }

    /// The exchange-or-context argument, if the method declared one.
    pub fn scope(&self) -> Option<&CallScope> {
        self.values.iter().find_map(|v| match v {
            ArgValue::Scope(scope) => Some(scope),
            _ => None,
        })
    }

    /// The protocol-request argument, if the method declared one.
    pub fn request(&self) -> Option<&IncomingRequest> {
        self.values.iter().find_map(|v| match v {
            ArgValue::Request(req) => Some(req),
            _ => None,
        })
    }

    /// The metadata accessor, if the method declared one.
    pub fn meta(&self) -> Option<&Meta> {
        self.values.iter().find_map(|v| match v {
            ArgValue::Meta(meta) => Some(meta),
            _ => None,
        })
    }

    /// The progress token, if the method declared the parameter and the
    /// client sent a token.
    pub fn progress_token(&self) -> Option<&ProgressToken> {
        self.values.iter().find_map(|v| match v {
            ArgValue::Progress(token) => token.as_ref(),
            _ => None,
        })
    }

    /// The arguments-map argument, if the method declared one.
    pub fn arguments(&self) -> Option<&Map<String, Value>> {
        self.values.iter().find_map(|v| match v {
            ArgValue::ArgumentsMap(map) => Some(map),
            _ => None,
        })
    }

    /// A named argument's resolved value, by exposed name. `None` when the
    /// method did not declare it or the request did not supply it.
    pub fn named(&self, name: &str) -> Option<&Value> {
        self.binding
            .roles()
            .iter()
            .zip(&self.values)
            .find_map(|(role, value)| match (role, value) {
                (
                    ParameterRole::NamedArgument { name: n, .. },
                    ArgValue::Named(resolved),
                ) if n == name => resolved.as_ref(),
                _ => None,
            })
    }

    /// Deserialize a named argument into a concrete type.
    ///
    /// Absent values come back as `Ok(None)`; a present value that fails to
    /// deserialize is a conversion error.
    pub fn named_as<T: DeserializeOwned>(&self, name: &str) -> CallResult<Option<T>> {
        match self.named(name) {
            None => Ok(None),
            Some(value) => serde_json::from_value(value.clone()).map(Some).map_err(|_| {
                CallError::Conversion {
                    argument: name.to_string(),
                    expected: std::any::type_name::<T>().to_string(),
                    value: value.clone(),
                }
            }),
        }
    }
}

/// Resolve the ordered argument list for one invocation.
pub fn resolve_args(
    binding: &Arc<MethodBinding>,
    scope: &CallScope,
    request: Option<&IncomingRequest>,
) -> CallResult<Args> {
    // The single most common call-time failure; nothing else resolves first.
    let request = request.ok_or(CallError::NullRequest)?;

    let template_vars: Option<HashMap<String, String>> = match binding.template() {
        Some(template) => {
            let uri = request.uri.as_deref().unwrap_or_default();
            let vars = template
                .extract(uri)
                .ok_or_else(|| CallError::TemplateMismatch {
                    template: template.as_str().to_string(),
                    uri: uri.to_string(),
                })?;
            Some(vars)
        }
        None => None,
    };

    let mut values = Vec::with_capacity(binding.roles().len());
    for role in binding.roles() {
        let value = match role {
            ParameterRole::ExchangeOrContext => ArgValue::Scope(scope.clone()),
            ParameterRole::ProtocolRequest => ArgValue::Request(request.clone()),
            ParameterRole::Metadata => ArgValue::Meta(Meta::from_option(request.meta.clone())),
            ParameterRole::ProgressToken => {
                ArgValue::Progress(request.progress_token.clone())
            }
            ParameterRole::ArgumentsMap => ArgValue::ArgumentsMap(request.arguments.clone()),
            ParameterRole::NamedArgument { name, shape, .. } => {
                let raw = match &template_vars {
                    Some(vars) => vars.get(name).map(|v| Value::String(v.clone())),
                    None => request.arguments.get(name).cloned(),
                };
                match raw {
                    Some(raw) => {
                        let coerced =
                            coerce(shape, raw).map_err(|failure| CallError::Conversion {
                                argument: name.clone(),
                                expected: failure.expected,
                                value: failure.value,
                            })?;
                        ArgValue::Named(Some(coerced))
                    }
                    // Missing arguments resolve to absent, never to an error.
                    None => ArgValue::Named(None),
                }
            }
        };
        values.push(value);
    }

    Ok(Args::new(binding.clone(), values))
}
