//! Authentication scheme extraction

use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::types::{ApiKeyLocation, AuthDescriptor, OAuthFlow, SchemeKind};

/// Scheme table keyed by the document's scheme names, in declaration order.
pub(crate) type SchemeTable = IndexMap<String, Arc<AuthDescriptor>>;

/// Extract the document's declared security schemes into normalized
/// descriptors.
///
/// Computed once per document; every operation that declares a scheme shares
/// the same descriptor by reference. Unrecognized scheme types are still
/// recorded with their raw type and description so a newer document does not
/// break loading.
pub(crate) fn extract_schemes(document: &Value) -> SchemeTable {
    let mut table = SchemeTable::new();

    let schemes = match document
        .pointer("/components/securitySchemes")
        .and_then(Value::as_object)
    {
        Some(schemes) => schemes,
        None => return table,
    };

    for (name, scheme) in schemes {
        let scheme_type = scheme
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let description = scheme
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string);

        let kind = match scheme_type {
            "apiKey" => SchemeKind::ApiKey {
                name: string_field(scheme, "name").unwrap_or_default(),
                location: match scheme.get("in").and_then(Value::as_str) {
                    Some("query") => ApiKeyLocation::Query,
                    _ => ApiKeyLocation::Header,
                },
            },
            "oauth2" => SchemeKind::OAuth2 {
                flows: extract_flows(scheme.get("flows")),
            },
            "http" => SchemeKind::Http {
                scheme: string_field(scheme, "scheme").unwrap_or_default(),
            },
            other => SchemeKind::Other {
                scheme_type: other.to_string(),
            },
        };

        debug!("Extracted security scheme '{}' ({})", name, kind.type_str());
        table.insert(name.clone(), Arc::new(AuthDescriptor { description, scheme: kind }));
    }

    table
}

/// Capture every declared flow with its URLs and scope table.
fn extract_flows(flows: Option<&Value>) -> IndexMap<String, OAuthFlow> {
    let mut extracted = IndexMap::new();

    let flows = match flows.and_then(Value::as_object) {
        Some(flows) => flows,
        None => return extracted,
    };

    for (flow_name, flow) in flows {
        let scopes = flow
            .get("scopes")
            .and_then(Value::as_object)
            .map(|scopes| {
                scopes
                    .iter()
                    .filter_map(|(scope, desc)| {
                        desc.as_str().map(|d| (scope.clone(), d.to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default();

        extracted.insert(
            flow_name.clone(),
            OAuthFlow {
                authorization_url: string_field(flow, "authorizationUrl"),
                token_url: string_field(flow, "tokenUrl"),
                refresh_url: string_field(flow, "refreshUrl"),
                scopes,
            },
        );
    }

    extracted
}

fn string_field(value: &Value, field: &str) -> Option<String> {
    value.get(field).and_then(Value::as_str).map(str::to_string)
}
