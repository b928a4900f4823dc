//! Declared value shapes and JSON-structural coercion
//!
//! A named argument declares a [`ValueShape`]; the resolver coerces the raw
//! incoming value against it. Coercion is structural in the JSON sense:
//! numbers, strings, booleans, nested objects and lists, and enums matched
//! by case-sensitive name. [`ValueShape::typed`] erases a serde-deserializable
//! Rust type into a shape, with its schema described via `schemars`.

use std::fmt;
use std::sync::Arc;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// What a coercion failure looked like, before the resolver attaches the
/// argument name.
#[derive(Debug, Clone)]
pub struct CoercionFailure {
    /// Name of the expected shape (e.g. "integer", "enum[Red, Green]").
    pub expected: String,
    /// The offending raw value.
    pub value: Value,
}

/// A shape-erased typed argument: schema plus a deserialization check.
#[derive(Clone)]
pub struct TypedShape {
    name: &'static str,
    schema: Arc<Value>,
    check: Arc<dyn Fn(&Value) -> Result<(), String> + Send + Sync>,
}

impl TypedShape {
    /// Erase `T` into a typed shape. The schema comes from `schemars`; the
    /// check is a serde deserialization probe.
    pub fn of<T: JsonSchema + DeserializeOwned>() -> Self {
        let schema = serde_json::to_value(schemars::schema_for!(T))
            .unwrap_or_else(|_| serde_json::json!({ "type": "object" }));
        Self {
            name: std::any::type_name::<T>(),
            schema: Arc::new(schema),
            check: Arc::new(|value| {
                serde_json::from_value::<T>(value.clone())
                    .map(|_| ())
                    .map_err(|e| e.to_string())
            }),
        }
    }

    /// The Rust type name this shape was erased from.
    pub fn type_name(&self) -> &'static str {
        self.name
    }

    /// The described JSON schema.
    pub fn schema(&self) -> &Value {
        &self.schema
    }

    fn check(&self, value: &Value) -> Result<(), String> {
        (self.check)(value)
    }
}

impl fmt::Debug for TypedShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedShape").field("name", &self.name).finish()
    }
}

/// The declared shape of a named argument.
#[derive(Debug, Clone)]
pub enum ValueShape {
    /// Any JSON string.
    String,
    /// An integral number. A float with zero fraction is accepted and
    /// normalized to an integer.
    Integer,
    /// Any JSON number.
    Float,
    /// A JSON boolean.
    Boolean,
    /// A string matching one of the listed case names, case-sensitively.
    Enum(Vec<String>),
    /// Any JSON object.
    Object,
    /// A JSON array whose elements all coerce to the inner shape.
    List(Box<ValueShape>),
    /// Anything; the value passes through verbatim.
    Any,
    /// A serde-deserializable Rust type, erased.
    Typed(TypedShape),
}

impl ValueShape {
    /// A list of the given element shape.
    pub fn list(inner: ValueShape) -> Self {
        ValueShape::List(Box::new(inner))
    }

    /// An enum over the given case names.
    pub fn cases<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ValueShape::Enum(names.into_iter().map(Into::into).collect())
    }

    /// Erase a serde-deserializable type into a shape.
    pub fn typed<T: JsonSchema + DeserializeOwned>() -> Self {
        ValueShape::Typed(TypedShape::of::<T>())
    }

    /// Human-readable shape name, used in conversion diagnostics.
    pub fn name(&self) -> String {
        match self {
            ValueShape::String => "string".to_string(),
            ValueShape::Integer => "integer".to_string(),
            ValueShape::Float => "number".to_string(),
            ValueShape::Boolean => "boolean".to_string(),
            ValueShape::Enum(names) => format!("enum[{}]", names.join(", ")),
            ValueShape::Object => "object".to_string(),
            ValueShape::List(inner) => format!("list<{}>", inner.name()),
            ValueShape::Any => "any".to_string(),
            ValueShape::Typed(typed) => typed.type_name().to_string(),
        }
    }

    fn fail(&self, value: &Value) -> CoercionFailure {
        CoercionFailure {
            expected: self.name(),
            value: value.clone(),
        }
    }
}

/// Coerce a raw value against a declared shape.
///
/// Returns the (possibly normalized) value, or a [`CoercionFailure`] naming
/// the expected shape and the offending raw value.
pub fn coerce(shape: &ValueShape, value: Value) -> Result<Value, CoercionFailure> {
    match shape {
        ValueShape::Any => Ok(value),
        ValueShape::String => match value {
            Value::String(_) => Ok(value),
            other => Err(shape.fail(&other)),
        },
        ValueShape::Integer => match &value {
            Value::Number(n) => {
                if n.is_i64() || n.is_u64() {
                    Ok(value)
                } else if let Some(f) = n.as_f64() {
                    if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
                        Ok(Value::from(f as i64))
                    } else {
                        Err(shape.fail(&value))
                    }
                } else {
                    Err(shape.fail(&value))
                }
            }
            _ => Err(shape.fail(&value)),
        },
        ValueShape::Float => match value {
            Value::Number(_) => Ok(value),
            other => Err(shape.fail(&other)),
        },
        ValueShape::Boolean => match value {
            Value::Bool(_) => Ok(value),
            other => Err(shape.fail(&other)),
        },
        ValueShape::Enum(names) => match &value {
            Value::String(s) if names.iter().any(|n| n == s) => Ok(value),
            _ => Err(shape.fail(&value)),
        },
        ValueShape::Object => match value {
            Value::Object(_) => Ok(value),
            other => Err(shape.fail(&other)),
        },
        ValueShape::List(inner) => match value {
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(coerce(inner, item).map_err(|mut failure| {
                        failure.expected = shape.name();
                        failure
                    })?);
                }
                Ok(Value::Array(out))
            }
            other => Err(shape.fail(&other)),
        },
        ValueShape::Typed(typed) => match typed.check(&value) {
            Ok(()) => Ok(value),
            Err(_) => Err(shape.fail(&value)),
        },
    }
}
