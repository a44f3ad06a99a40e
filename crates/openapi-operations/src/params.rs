//! Parameter extraction and request-body flattening

use serde_json::Value;

use crate::error::LoadResult;
use crate::resolver::RefResolver;
use crate::types::{ParamType, ParameterDescriptor, ParameterLocation};

/// Extract one operation's parameters as a flat ordered list.
///
/// Declared parameters come first in declaration order, then the request
/// body's top-level properties flattened with `location = body`: one
/// descriptor per property per content type, with no de-duplication across
/// content types. Nested structure below the body schema's top level is not
/// preserved.
pub(crate) fn extract_parameters(
    operation: &Value,
    resolver: &RefResolver<'_>,
) -> LoadResult<Vec<ParameterDescriptor>> {
    let mut descriptors = Vec::new();

    if let Some(declared) = operation.get("parameters").and_then(Value::as_array) {
        for parameter in declared {
            let parameter = resolver.deref(parameter)?;
            let schema = match parameter.get("schema") {
                Some(schema) => Some(resolver.deref(schema)?),
                None => None,
            };

            // The parameter's own description wins over its schema's.
            let description = parameter
                .get("description")
                .and_then(Value::as_str)
                .or_else(|| {
                    schema
                        .and_then(|s| s.get("description"))
                        .and_then(Value::as_str)
                })
                .unwrap_or_default()
                .to_string();

            descriptors.push(ParameterDescriptor {
                name: parameter
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                location: ParameterLocation::parse(
                    parameter.get("in").and_then(Value::as_str).unwrap_or_default(),
                ),
                param_type: schema.map(ParamType::from_schema).unwrap_or(ParamType::String),
                required: parameter
                    .get("required")
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
                description,
            });
        }
    }

    if let Some(request_body) = operation.get("requestBody") {
        let request_body = resolver.deref(request_body)?;
        if let Some(content) = request_body.get("content").and_then(Value::as_object) {
            for media_type in content.values() {
                let schema = match media_type.get("schema") {
                    Some(schema) => resolver.deref(schema)?,
                    None => continue,
                };
                flatten_body_schema(schema, resolver, &mut descriptors)?;
            }
        }
    }

    // Positional fallback keeps every descriptor addressable by name.
    for (index, descriptor) in descriptors.iter_mut().enumerate() {
        if descriptor.name.is_empty() {
            descriptor.name = format!("param_{}", index);
        }
    }

    Ok(descriptors)
}

/// Flatten one level of a body schema: each top-level property becomes an
/// independent body-located descriptor. A schema without `properties`
/// contributes nothing.
fn flatten_body_schema(
    schema: &Value,
    resolver: &RefResolver<'_>,
    descriptors: &mut Vec<ParameterDescriptor>,
) -> LoadResult<()> {
    let properties = match schema.get("properties").and_then(Value::as_object) {
        Some(properties) => properties,
        None => return Ok(()),
    };
    let required_list = schema.get("required").and_then(Value::as_array);

    for (property_name, property_schema) in properties {
        let property_schema = resolver.deref(property_schema)?;
        let required = required_list
            .map(|list| {
                list.iter()
                    .any(|entry| entry.as_str() == Some(property_name.as_str()))
            })
            .unwrap_or(false);

        descriptors.push(ParameterDescriptor {
            name: property_name.clone(),
            location: ParameterLocation::Body,
            param_type: ParamType::from_schema(property_schema),
            required,
            description: property_schema
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn extract(document: &Value, operation: &Value) -> Vec<ParameterDescriptor> {
        let resolver = RefResolver::new(document);
        extract_parameters(operation, &resolver).unwrap()
    }

    #[test]
    fn test_declared_parameters() {
        let document = json!({});
        let operation = json!({
            "parameters": [
                {
                    "name": "id",
                    "in": "path",
                    "required": true,
                    "schema": {"type": "integer"},
                    "description": "Item identifier"
                },
                {
                    "name": "verbose",
                    "in": "query",
                    "schema": {"type": "boolean"}
                }
            ]
        });

        let params = extract(&document, &operation);
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].name, "id");
        assert_eq!(params[0].location, ParameterLocation::Path);
        assert_eq!(params[0].param_type, ParamType::Integer);
        assert!(params[0].required);
        assert_eq!(params[0].description, "Item identifier");
        assert_eq!(params[1].location, ParameterLocation::Query);
        assert!(!params[1].required);
        assert_eq!(params[1].description, "");
    }

    #[test]
    fn test_parameter_ref_resolution() {
        let document = json!({
            "components": {
                "parameters": {
                    "PageSize": {
                        "name": "page_size",
                        "in": "query",
                        "schema": {"$ref": "#/components/schemas/Size"}
                    }
                },
                "schemas": {
                    "Size": {"type": "integer", "description": "Page size"}
                }
            }
        });
        let operation = json!({
            "parameters": [{"$ref": "#/components/parameters/PageSize"}]
        });

        let params = extract(&document, &operation);
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].name, "page_size");
        assert_eq!(params[0].param_type, ParamType::Integer);
        // Description falls back to the resolved schema's.
        assert_eq!(params[0].description, "Page size");
    }

    #[test]
    fn test_body_flattening() {
        let document = json!({});
        let operation = json!({
            "requestBody": {
                "content": {
                    "application/json": {
                        "schema": {
                            "type": "object",
                            "required": ["name"],
                            "properties": {
                                "name": {"type": "string", "description": "Display name"},
                                "count": {"type": "integer"}
                            }
                        }
                    }
                }
            }
        });

        let params = extract(&document, &operation);
        assert_eq!(params.len(), 2);
        let name = params.iter().find(|p| p.name == "name").unwrap();
        assert_eq!(name.location, ParameterLocation::Body);
        assert!(name.required);
        assert_eq!(name.description, "Display name");
        let count = params.iter().find(|p| p.name == "count").unwrap();
        assert!(!count.required);
        assert_eq!(count.description, "");
    }

    #[test]
    fn test_body_without_properties() {
        let document = json!({});
        let operation = json!({
            "requestBody": {
                "content": {
                    "application/json": {"schema": {"type": "string"}}
                }
            }
        });

        assert!(extract(&document, &operation).is_empty());
    }

    #[test]
    fn test_multiple_content_types_each_contribute() {
        let document = json!({});
        let operation = json!({
            "requestBody": {
                "content": {
                    "application/json": {
                        "schema": {"properties": {"value": {"type": "string"}}}
                    },
                    "application/x-www-form-urlencoded": {
                        "schema": {"properties": {"value": {"type": "string"}}}
                    }
                }
            }
        });

        // One descriptor per content type, by contract.
        let params = extract(&document, &operation);
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].name, "value");
        assert_eq!(params[1].name, "value");
    }

    #[test]
    fn test_missing_name_gets_positional_fallback() {
        let document = json!({});
        let operation = json!({
            "parameters": [
                {"name": "real", "in": "query"},
                {"in": "query", "schema": {"type": "string"}}
            ]
        });

        let params = extract(&document, &operation);
        assert_eq!(params[0].name, "real");
        assert_eq!(params[1].name, "param_1");
    }

    #[test]
    fn test_body_ref_at_every_level() {
        let document = json!({
            "components": {
                "requestBodies": {
                    "Item": {
                        "content": {
                            "application/json": {
                                "schema": {"$ref": "#/components/schemas/Item"}
                            }
                        }
                    }
                },
                "schemas": {
                    "Item": {
                        "type": "object",
                        "properties": {
                            "tag": {"$ref": "#/components/schemas/Tag"}
                        }
                    },
                    "Tag": {"type": "string", "description": "Item tag"}
                }
            }
        });
        let operation = json!({
            "requestBody": {"$ref": "#/components/requestBodies/Item"}
        });

        let params = extract(&document, &operation);
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].name, "tag");
        assert_eq!(params[0].param_type, ParamType::String);
        assert_eq!(params[0].description, "Item tag");
    }
}
