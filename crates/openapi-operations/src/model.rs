//! Synthesized per-operation validation model

use indexmap::IndexMap;
use serde_json::{json, Map, Value};

use crate::error::ValidationError;
use crate::types::{ParamType, ParameterDescriptor};

/// One named field of a validation model
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub param_type: ParamType,
    pub required: bool,
    pub description: String,
}

/// The contract enforced against supplied arguments before invocation.
///
/// A data-driven schema synthesized from the descriptor list at compile time
/// and checked by one generic routine; the compiler carries no per-operation
/// special cases. Required fields have no default and must be supplied;
/// optional fields default to absent.
#[derive(Debug, Clone)]
pub struct ValidationModel {
    fields: IndexMap<String, FieldSpec>,
}

impl ValidationModel {
    /// One field per descriptor, keyed by name. Supplied arguments are a flat
    /// name-to-value map, so a later same-named descriptor supersedes an
    /// earlier one here; the router still places the one supplied value at
    /// every location that declares the name.
    pub fn from_descriptors(parameters: &[ParameterDescriptor]) -> Self {
        let mut fields = IndexMap::new();
        for parameter in parameters {
            fields.insert(
                parameter.name.clone(),
                FieldSpec {
                    name: parameter.name.clone(),
                    param_type: parameter.param_type,
                    required: parameter.required,
                    description: parameter.description.clone(),
                },
            );
        }
        Self { fields }
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.values()
    }

    /// Check supplied arguments against the model, returning the coerced
    /// values that were actually supplied.
    ///
    /// Names outside the model and explicit nulls are dropped, not errors; a
    /// missing required field or an uncoercible value fails validation.
    pub fn check(&self, arguments: &Value) -> Result<Map<String, Value>, ValidationError> {
        let supplied = arguments.as_object().ok_or(ValidationError::NotAnObject)?;
        let mut checked = Map::new();

        for field in self.fields.values() {
            match supplied.get(&field.name) {
                None => {
                    if field.required {
                        return Err(ValidationError::MissingRequired(field.name.clone()));
                    }
                }
                Some(Value::Null) => {}
                Some(value) => {
                    let coerced = coerce(value, field.param_type).ok_or_else(|| {
                        ValidationError::Type {
                            name: field.name.clone(),
                            expected: field.param_type.schema_type().unwrap_or("any"),
                        }
                    })?;
                    checked.insert(field.name.clone(), coerced);
                }
            }
        }

        Ok(checked)
    }

    /// Render the model as a JSON-Schema object for discovery.
    pub fn schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for field in self.fields.values() {
            let mut property = Map::new();
            if let Some(type_keyword) = field.param_type.schema_type() {
                property.insert("type".to_string(), json!(type_keyword));
            }
            if !field.description.is_empty() {
                property.insert("description".to_string(), json!(field.description));
            }
            properties.insert(field.name.clone(), Value::Object(property));

            if field.required {
                required.push(field.name.clone());
            }
        }

        let mut schema = json!({
            "type": "object",
            "properties": properties,
        });
        if !required.is_empty() {
            schema["required"] = json!(required);
        }

        schema
    }
}

/// Coerce a supplied value to its declared type. Numeric strings are accepted
/// for whole-number and floating-point fields, scalars are stringified for
/// text fields; sequences and mappings must already have the right shape.
fn coerce(value: &Value, param_type: ParamType) -> Option<Value> {
    match param_type {
        ParamType::Any => Some(value.clone()),
        ParamType::String => match value {
            Value::String(_) => Some(value.clone()),
            Value::Number(n) => Some(Value::String(n.to_string())),
            Value::Bool(b) => Some(Value::String(b.to_string())),
            _ => None,
        },
        ParamType::Integer => match value {
            Value::Number(n) if n.is_i64() || n.is_u64() => Some(value.clone()),
            Value::Number(n) => n
                .as_f64()
                .filter(|f| f.fract() == 0.0)
                .map(|f| json!(f as i64)),
            Value::String(s) => s.parse::<i64>().ok().map(|i| json!(i)),
            _ => None,
        },
        ParamType::Number => match value {
            Value::Number(_) => Some(value.clone()),
            Value::String(s) => s.parse::<f64>().ok().and_then(|f| {
                serde_json::Number::from_f64(f).map(Value::Number)
            }),
            _ => None,
        },
        ParamType::Boolean => match value {
            Value::Bool(_) => Some(value.clone()),
            _ => None,
        },
        ParamType::Array => match value {
            Value::Array(_) => Some(value.clone()),
            _ => None,
        },
        ParamType::Object => match value {
            Value::Object(_) => Some(value.clone()),
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ParameterLocation;

    fn descriptor(name: &str, param_type: ParamType, required: bool) -> ParameterDescriptor {
        ParameterDescriptor {
            name: name.to_string(),
            location: ParameterLocation::Query,
            param_type,
            required,
            description: String::new(),
        }
    }

    #[test]
    fn test_missing_required() {
        let model = ValidationModel::from_descriptors(&[descriptor("id", ParamType::String, true)]);

        let err = model.check(&json!({})).unwrap_err();
        assert_eq!(err, ValidationError::MissingRequired("id".to_string()));
    }

    #[test]
    fn test_optional_absent_is_fine() {
        let model =
            ValidationModel::from_descriptors(&[descriptor("limit", ParamType::Integer, false)]);

        let checked = model.check(&json!({})).unwrap();
        assert!(checked.is_empty());
    }

    #[test]
    fn test_integer_coercion() {
        let model = ValidationModel::from_descriptors(&[descriptor("n", ParamType::Integer, true)]);

        assert_eq!(model.check(&json!({"n": 7})).unwrap()["n"], json!(7));
        assert_eq!(model.check(&json!({"n": "7"})).unwrap()["n"], json!(7));
        assert_eq!(model.check(&json!({"n": 7.0})).unwrap()["n"], json!(7));

        let err = model.check(&json!({"n": "seven"})).unwrap_err();
        assert_eq!(
            err,
            ValidationError::Type {
                name: "n".to_string(),
                expected: "integer"
            }
        );
        assert!(model.check(&json!({"n": 7.5})).is_err());
    }

    #[test]
    fn test_number_coercion() {
        let model = ValidationModel::from_descriptors(&[descriptor("x", ParamType::Number, true)]);

        assert_eq!(model.check(&json!({"x": 1.5})).unwrap()["x"], json!(1.5));
        assert_eq!(model.check(&json!({"x": "1.5"})).unwrap()["x"], json!(1.5));
        assert!(model.check(&json!({"x": true})).is_err());
    }

    #[test]
    fn test_string_accepts_scalars() {
        let model = ValidationModel::from_descriptors(&[descriptor("s", ParamType::String, true)]);

        assert_eq!(model.check(&json!({"s": 42})).unwrap()["s"], json!("42"));
        assert_eq!(
            model.check(&json!({"s": true})).unwrap()["s"],
            json!("true")
        );
        assert!(model.check(&json!({"s": []})).is_err());
    }

    #[test]
    fn test_boolean_is_strict() {
        let model = ValidationModel::from_descriptors(&[descriptor("b", ParamType::Boolean, true)]);

        assert_eq!(model.check(&json!({"b": true})).unwrap()["b"], json!(true));
        assert!(model.check(&json!({"b": "true"})).is_err());
    }

    #[test]
    fn test_unknown_names_and_nulls_dropped() {
        let model =
            ValidationModel::from_descriptors(&[descriptor("known", ParamType::String, false)]);

        let checked = model
            .check(&json!({"known": null, "stray": "x"}))
            .unwrap();
        assert!(checked.is_empty());
    }

    #[test]
    fn test_arguments_must_be_object() {
        let model = ValidationModel::from_descriptors(&[]);
        assert_eq!(
            model.check(&json!([1, 2])).unwrap_err(),
            ValidationError::NotAnObject
        );
    }

    #[test]
    fn test_same_name_later_descriptor_wins() {
        let mut path_id = descriptor("id", ParamType::Integer, true);
        path_id.location = ParameterLocation::Path;
        let body_id = descriptor("id", ParamType::String, false);

        let model = ValidationModel::from_descriptors(&[path_id, body_id]);
        let fields: Vec<&FieldSpec> = model.fields().collect();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].param_type, ParamType::String);
        assert!(!fields[0].required);
    }

    #[test]
    fn test_schema_rendering() {
        let model = ValidationModel::from_descriptors(&[
            descriptor("id", ParamType::Integer, true),
            ParameterDescriptor {
                name: "note".to_string(),
                location: ParameterLocation::Body,
                param_type: ParamType::String,
                required: false,
                description: "Free-form note".to_string(),
            },
        ]);

        let schema = model.schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["id"]["type"], "integer");
        assert_eq!(schema["properties"]["note"]["description"], "Free-form note");
        assert_eq!(schema["required"], json!(["id"]));
    }
}
