//! Operation compilation

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::auth::SchemeTable;
use crate::error::LoadResult;
use crate::model::ValidationModel;
use crate::params::extract_parameters;
use crate::resolver::RefResolver;
use crate::types::{AuthRequirement, HttpMethod, OperationSpec};

/// Compile every `(path, method, operation)` triple in the document's path
/// table into an immutable [`OperationSpec`].
///
/// Iteration order is the document's path table order, then its method table
/// order; that ordering is preserved in the result and is part of the
/// observable contract. Entries whose key is not an HTTP method, or whose
/// value is not a mapping (shared parameter blocks, summaries), are skipped.
pub(crate) fn compile_document(
    document: &Value,
    schemes: &SchemeTable,
) -> LoadResult<Vec<Arc<OperationSpec>>> {
    let resolver = RefResolver::new(document);
    let base_url = document
        .pointer("/servers/0/url")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let mut operations = Vec::new();
    let paths = match document.get("paths").and_then(Value::as_object) {
        Some(paths) => paths,
        None => return Ok(operations),
    };

    for (path, path_item) in paths {
        let methods = match path_item.as_object() {
            Some(methods) => methods,
            None => continue,
        };
        for (key, operation) in methods {
            let method = match HttpMethod::parse(key) {
                Some(method) => method,
                None => continue,
            };
            if !operation.is_object() {
                continue;
            }
            let spec = compile_operation(path, method, operation, base_url, schemes, &resolver)?;
            debug!("Compiled {} {} as '{}'", method, path, spec.name);
            operations.push(Arc::new(spec));
        }
    }

    Ok(operations)
}

fn compile_operation(
    path: &str,
    method: HttpMethod,
    operation: &Value,
    base_url: &str,
    schemes: &SchemeTable,
    resolver: &RefResolver<'_>,
) -> LoadResult<OperationSpec> {
    let parameters = extract_parameters(operation, resolver)?;

    // Summary wins; an empty summary falls through to the description.
    let description = operation
        .get("summary")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|summary| !summary.is_empty())
        .or_else(|| operation.get("description").and_then(Value::as_str).map(str::trim))
        .unwrap_or_default()
        .to_string();

    let auth = resolve_security(operation.get("security"), schemes);
    let model = ValidationModel::from_descriptors(&parameters);

    Ok(OperationSpec {
        name: derive_name(path),
        description,
        method,
        path_template: path.to_string(),
        base_url: base_url.to_string(),
        parameters,
        auth,
        model,
    })
}

/// Derive an operation name from its path template: `/items/{id}` becomes
/// `items_id`.
pub(crate) fn derive_name(path: &str) -> String {
    let name = path.replace('/', "_").replace('{', "").replace('}', "");
    match name.strip_prefix('_') {
        Some(stripped) => stripped.to_string(),
        None => name,
    }
}

/// Resolve an operation's declared security entries against the scheme table.
/// An entry naming an undeclared scheme is skipped, not an error.
fn resolve_security(security: Option<&Value>, schemes: &SchemeTable) -> Vec<AuthRequirement> {
    let mut requirements = Vec::new();

    let entries = match security.and_then(Value::as_array) {
        Some(entries) => entries,
        None => return requirements,
    };

    for entry in entries {
        let entry = match entry.as_object() {
            Some(entry) => entry,
            None => continue,
        };
        for (scheme_name, scopes) in entry {
            match schemes.get(scheme_name) {
                Some(descriptor) => requirements.push(AuthRequirement {
                    scheme_name: scheme_name.clone(),
                    scopes: scopes
                        .as_array()
                        .map(|list| {
                            list.iter()
                                .filter_map(Value::as_str)
                                .map(str::to_string)
                                .collect()
                        })
                        .unwrap_or_default(),
                    descriptor: Arc::clone(descriptor),
                }),
                None => {
                    warn!("Operation references undeclared security scheme '{}'", scheme_name);
                }
            }
        }
    }

    requirements
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::extract_schemes;
    use serde_json::json;

    fn compile(document: &Value) -> Vec<Arc<OperationSpec>> {
        let schemes = extract_schemes(document);
        compile_document(document, &schemes).unwrap()
    }

    #[test]
    fn test_derive_name() {
        assert_eq!(derive_name("/items/{id}"), "items_id");
        assert_eq!(derive_name("/users"), "users");
        assert_eq!(derive_name("/users/{id}/posts/{post_id}"), "users_id_posts_post_id");
    }

    #[test]
    fn test_count_and_order() {
        let document = json!({
            "paths": {
                "/b": {
                    "get": {"summary": "List b"},
                    "post": {"summary": "Create b"}
                },
                "/a": {
                    "parameters": [{"name": "x", "in": "query"}],
                    "get": {"summary": "List a"}
                }
            }
        });

        let operations = compile(&document);
        assert_eq!(operations.len(), 3);
        assert_eq!(operations[0].name, "b");
        assert_eq!(operations[0].method, HttpMethod::Get);
        assert_eq!(operations[1].method, HttpMethod::Post);
        assert_eq!(operations[2].name, "a");
    }

    #[test]
    fn test_non_mapping_entries_skipped() {
        let document = json!({
            "paths": {
                "/x": {
                    "summary": "Not an operation",
                    "get": {"summary": "Real"}
                }
            }
        });

        let operations = compile(&document);
        assert_eq!(operations.len(), 1);
        assert_eq!(operations[0].description, "Real");
    }

    #[test]
    fn test_description_fallbacks() {
        let document = json!({
            "paths": {
                "/summary": {"get": {"summary": "From summary", "description": "Ignored"}},
                "/description": {"get": {"summary": "", "description": "From description"}},
                "/neither": {"get": {}}
            }
        });

        let operations = compile(&document);
        assert_eq!(operations[0].description, "From summary");
        assert_eq!(operations[1].description, "From description");
        assert_eq!(operations[2].description, "");
    }

    #[test]
    fn test_base_url_from_first_server() {
        let document = json!({
            "servers": [
                {"url": "https://api.example.com/v1"},
                {"url": "https://backup.example.com"}
            ],
            "paths": {"/x": {"get": {}}}
        });

        assert_eq!(compile(&document)[0].base_url, "https://api.example.com/v1");
    }

    #[test]
    fn test_missing_servers_yield_empty_base_url() {
        let document = json!({"paths": {"/x": {"get": {}}}});
        assert_eq!(compile(&document)[0].base_url, "");
    }

    #[test]
    fn test_security_resolution() {
        let document = json!({
            "components": {
                "securitySchemes": {
                    "keyAuth": {"type": "apiKey", "in": "header", "name": "X-Key"},
                    "oauth": {"type": "oauth2", "flows": {}}
                }
            },
            "paths": {
                "/x": {
                    "get": {
                        "security": [
                            {"keyAuth": []},
                            {"oauth": ["read", "write"]},
                            {"ghost": []}
                        ]
                    }
                }
            }
        });

        let operations = compile(&document);
        let auth = &operations[0].auth;
        // The undeclared scheme is skipped silently.
        assert_eq!(auth.len(), 2);
        assert_eq!(auth[0].scheme_name, "keyAuth");
        assert!(auth[0].scopes.is_empty());
        assert_eq!(auth[1].scheme_name, "oauth");
        assert_eq!(auth[1].scopes, ["read", "write"]);
    }

    #[test]
    fn test_no_security_means_no_requirements() {
        let document = json!({
            "components": {
                "securitySchemes": {
                    "keyAuth": {"type": "apiKey", "in": "header", "name": "X-Key"}
                }
            },
            "paths": {"/x": {"get": {}}}
        });

        assert!(compile(&document)[0].auth.is_empty());
    }

    #[test]
    fn test_validation_model_attached() {
        let document = json!({
            "paths": {
                "/items/{id}": {
                    "get": {
                        "parameters": [
                            {"name": "id", "in": "path", "required": true, "schema": {"type": "integer"}}
                        ]
                    }
                }
            }
        });

        let operations = compile(&document);
        let schema = operations[0].input_schema();
        assert_eq!(schema["properties"]["id"]["type"], "integer");
        assert_eq!(schema["required"], json!(["id"]));
    }
}
