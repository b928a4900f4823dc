//! Argument schema description
//!
//! Builds the JSON-Schema object the surrounding provider layer consults to
//! describe which named arguments a binding exposes and which are required.
//! Scalar shapes map to hand-built fragments; typed shapes embed the schema
//! `schemars` generated when the shape was declared.

use serde_json::{Map, Value};

use crate::params::MethodBinding;
use crate::value::ValueShape;

/// The JSON-Schema description of a binding's named arguments.
pub fn argument_schema(binding: &MethodBinding) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for (name, shape, is_required) in binding.named_arguments() {
        properties.insert(name.to_string(), shape_schema(shape));
        if is_required {
            required.push(Value::String(name.to_string()));
        }
    }

    let mut schema = Map::new();
    schema.insert("type".to_string(), Value::String("object".to_string()));
    schema.insert("properties".to_string(), Value::Object(properties));
    if !required.is_empty() {
        schema.insert("required".to_string(), Value::Array(required));
    }
    Value::Object(schema)
}

fn shape_schema(shape: &ValueShape) -> Value {
    match shape {
        ValueShape::String => serde_json::json!({ "type": "string" }),
        ValueShape::Integer => serde_json::json!({ "type": "integer" }),
        ValueShape::Float => serde_json::json!({ "type": "number" }),
        ValueShape::Boolean => serde_json::json!({ "type": "boolean" }),
        ValueShape::Enum(names) => serde_json::json!({ "type": "string", "enum": names }),
        ValueShape::Object => serde_json::json!({ "type": "object" }),
        ValueShape::List(inner) => serde_json::json!({
            "type": "array",
            "items": shape_schema(inner),
        }),
        ValueShape::Any => serde_json::json!({}),
        ValueShape::Typed(typed) => typed.schema().clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::{CallKind, TransportMode};
    use crate::params::{classify, ParamDecl, ReturnDecl, ReturnShape};
    use schemars::JsonSchema;
    use serde::Deserialize;
    use serde_json::json;

    fn binding(params: Vec<ParamDecl>) -> MethodBinding {
        let roles = classify(CallKind::Tool, TransportMode::Session, &params).unwrap();
        MethodBinding::new(
            CallKind::Tool,
            TransportMode::Session,
            roles,
            ReturnDecl::plain(ReturnShape::Text),
            None,
            None,
        )
    }

    #[test]
    fn test_only_named_arguments_appear() {
        let b = binding(vec![
            ParamDecl::exchange(),
            ParamDecl::meta(),
            ParamDecl::arg("query", ValueShape::String),
            ParamDecl::arg("limit", ValueShape::Integer).optional(),
        ]);
        let schema = argument_schema(&b);

        let props = schema["properties"].as_object().unwrap();
        assert_eq!(props.len(), 2);
        assert_eq!(props["query"], json!({"type": "string"}));
        assert_eq!(props["limit"], json!({"type": "integer"}));
        assert_eq!(schema["required"], json!(["query"]));
    }

    #[test]
    fn test_no_required_key_when_everything_is_optional() {
        let b = binding(vec![ParamDecl::arg("x", ValueShape::Any).optional()]);
        let schema = argument_schema(&b);
        assert!(schema.get("required").is_none());
        assert_eq!(schema["properties"]["x"], json!({}));
    }

    #[test]
    fn test_nested_shapes_describe_recursively() {
        let b = binding(vec![ParamDecl::arg(
            "tags",
            ValueShape::list(ValueShape::cases(["a", "b"])),
        )]);
        let schema = argument_schema(&b);
        assert_eq!(
            schema["properties"]["tags"],
            json!({"type": "array", "items": {"type": "string", "enum": ["a", "b"]}})
        );
    }

    #[test]
    fn test_typed_shape_embeds_generated_schema() {
        #[derive(Deserialize, JsonSchema)]
        struct Filter {
            #[allow(dead_code)]
            field: String,
        }

        let b = binding(vec![ParamDecl::arg("filter", ValueShape::typed::<Filter>())]);
        let schema = argument_schema(&b);
        assert!(schema["properties"]["filter"]["properties"]["field"].is_object());
    }
}
