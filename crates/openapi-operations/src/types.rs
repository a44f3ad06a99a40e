//! Data model for compiled operations

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::model::ValidationModel;

/// HTTP methods recognized in a document's path tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Trace,
}

impl HttpMethod {
    /// Parse a path-item key into a method; non-method keys return `None`.
    pub fn parse(key: &str) -> Option<Self> {
        match key {
            "get" => Some(HttpMethod::Get),
            "post" => Some(HttpMethod::Post),
            "put" => Some(HttpMethod::Put),
            "patch" => Some(HttpMethod::Patch),
            "delete" => Some(HttpMethod::Delete),
            "head" => Some(HttpMethod::Head),
            "options" => Some(HttpMethod::Options),
            "trace" => Some(HttpMethod::Trace),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Trace => "TRACE",
        }
    }

    /// Whether accumulated body fields are sent for this method.
    ///
    /// Body-located values supplied to any other verb are discarded.
    pub fn allows_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a parameter travels in the outgoing request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Body,
}

impl ParameterLocation {
    /// Classify an `in` field. Anything that is not path/query/header rides
    /// in the request body, matching the invocation router's else-branch.
    pub fn parse(location: &str) -> Self {
        match location {
            "path" => ParameterLocation::Path,
            "query" => ParameterLocation::Query,
            "header" => ParameterLocation::Header,
            _ => ParameterLocation::Body,
        }
    }
}

impl std::fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParameterLocation::Path => write!(f, "path"),
            ParameterLocation::Query => write!(f, "query"),
            ParameterLocation::Header => write!(f, "header"),
            ParameterLocation::Body => write!(f, "body"),
        }
    }
}

/// Declared value type of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
    /// Unrecognized declared type; values pass validation unconstrained.
    Any,
}

impl ParamType {
    /// Read the `type` keyword of a schema. A schema without one is treated
    /// as text; an unrecognized type is unconstrained.
    pub fn from_schema(schema: &Value) -> Self {
        match schema.get("type").and_then(Value::as_str) {
            None => ParamType::String,
            Some("string") => ParamType::String,
            Some("integer") => ParamType::Integer,
            Some("number") => ParamType::Number,
            Some("boolean") => ParamType::Boolean,
            Some("array") => ParamType::Array,
            Some("object") => ParamType::Object,
            Some(_) => ParamType::Any,
        }
    }

    /// JSON-Schema type keyword, if the type is constrained.
    pub fn schema_type(&self) -> Option<&'static str> {
        match self {
            ParamType::String => Some("string"),
            ParamType::Integer => Some("integer"),
            ParamType::Number => Some("number"),
            ParamType::Boolean => Some("boolean"),
            ParamType::Array => Some("array"),
            ParamType::Object => Some("object"),
            ParamType::Any => None,
        }
    }
}

/// A normalized, immutable record describing one parameter.
///
/// Within one operation, `name` is unique only within a location: a path
/// parameter and a body field may legitimately share a name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    /// Parameter name; never empty (missing names get a positional fallback)
    pub name: String,
    /// Where the value travels in the outgoing request
    pub location: ParameterLocation,
    /// Declared value type
    pub param_type: ParamType,
    /// Whether the value must be supplied at invocation time
    pub required: bool,
    /// Human-readable description, empty when the document declares none
    pub description: String,
}

/// Where an API key travels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyLocation {
    Header,
    Query,
}

impl ApiKeyLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiKeyLocation::Header => "header",
            ApiKeyLocation::Query => "query",
        }
    }
}

/// One OAuth2 flow's endpoints and scope table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthFlow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_url: Option<String>,
    /// Scope name to description; may be empty
    pub scopes: IndexMap<String, String>,
}

/// Normalized authentication scheme descriptor.
///
/// Built once per named security scheme and shared by reference across every
/// operation that declares it; never mutated after extraction.
#[derive(Debug, Clone)]
pub struct AuthDescriptor {
    pub description: Option<String>,
    pub scheme: SchemeKind,
}

/// Closed variant set over the scheme types this core understands.
///
/// Dispatched once at extraction time and once more at injection time.
#[derive(Debug, Clone)]
pub enum SchemeKind {
    /// API key sent in a named header or query parameter
    ApiKey {
        name: String,
        location: ApiKeyLocation,
    },
    /// OAuth2, with every declared flow captured
    OAuth2 {
        flows: IndexMap<String, OAuthFlow>,
    },
    /// HTTP authentication (e.g. `bearer`)
    Http { scheme: String },
    /// Unrecognized scheme type, recorded for forward compatibility
    Other { scheme_type: String },
}

impl SchemeKind {
    /// The scheme's declared `type` string.
    pub fn type_str(&self) -> &str {
        match self {
            SchemeKind::ApiKey { .. } => "apiKey",
            SchemeKind::OAuth2 { .. } => "oauth2",
            SchemeKind::Http { .. } => "http",
            SchemeKind::Other { scheme_type } => scheme_type,
        }
    }
}

impl AuthDescriptor {
    /// Discovery rendering: `{type, description?, ...type-specific fields}`.
    pub fn to_value(&self) -> Value {
        let mut entry = Map::new();
        entry.insert("type".to_string(), json!(self.scheme.type_str()));
        if let Some(description) = &self.description {
            entry.insert("description".to_string(), json!(description));
        }
        match &self.scheme {
            SchemeKind::ApiKey { name, location } => {
                entry.insert("in".to_string(), json!(location.as_str()));
                entry.insert("name".to_string(), json!(name));
            }
            SchemeKind::OAuth2 { flows } => {
                entry.insert(
                    "flows".to_string(),
                    serde_json::to_value(flows).unwrap_or_default(),
                );
            }
            SchemeKind::Http { scheme } => {
                entry.insert("scheme".to_string(), json!(scheme));
            }
            SchemeKind::Other { .. } => {}
        }
        Value::Object(entry)
    }
}

/// One concrete binding of a security scheme to an operation.
///
/// Order follows declaration order in the document. The type-specific fields
/// live on the shared descriptor.
#[derive(Debug, Clone)]
pub struct AuthRequirement {
    /// Name of the scheme in the document's security-scheme table
    pub scheme_name: String,
    /// Required scopes (OAuth2); empty otherwise
    pub scopes: Vec<String>,
    /// The matching descriptor, shared across operations
    pub descriptor: Arc<AuthDescriptor>,
}

impl AuthRequirement {
    /// Discovery rendering: `{scheme_name, scopes, ...descriptor fields}`.
    pub fn to_value(&self) -> Value {
        let mut entry = match self.descriptor.to_value() {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        entry.insert("scheme_name".to_string(), json!(self.scheme_name));
        entry.insert("scopes".to_string(), json!(self.scopes));
        Value::Object(entry)
    }
}

/// The compiled, immutable unit of work.
///
/// Created once at load time and never mutated afterwards; safe for
/// concurrent read-only use by any number of callers.
#[derive(Debug, Clone)]
pub struct OperationSpec {
    /// Identifier derived from the path template; uniqueness across the set
    /// is assumed from document-level path uniqueness, not enforced here
    pub name: String,
    /// Summary, falling back to description, falling back to empty
    pub description: String,
    /// HTTP method
    pub method: HttpMethod,
    /// Path template with `{name}` placeholders (e.g. `/items/{id}`)
    pub path_template: String,
    /// First declared server URL, empty when the document declares none
    pub base_url: String,
    /// Flat ordered parameter list
    pub parameters: Vec<ParameterDescriptor>,
    /// Applicable authentication requirements, in declaration order
    pub auth: Vec<AuthRequirement>,
    /// Contract enforced against supplied arguments before invocation
    pub model: ValidationModel,
}

impl OperationSpec {
    /// Flat parameter list rendered as a JSON-Schema object.
    pub fn input_schema(&self) -> Value {
        self.model.schema()
    }

    /// Discovery entry: `{name, description, input_schema, auth}`.
    pub fn listing_entry(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "input_schema": self.input_schema(),
            "auth": self.auth.iter().map(AuthRequirement::to_value).collect::<Vec<_>>(),
        })
    }
}

/// Caller-supplied authentication material.
///
/// Sourced from the inbound request at the serving boundary; this core never
/// reads ambient process state to obtain credentials.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    /// Header name to value
    pub headers: HashMap<String, String>,
    /// Query parameter name to value
    pub query_params: HashMap<String, String>,
}

impl AuthContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a header value, builder-style.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Insert a query parameter value, builder-style.
    pub fn with_query_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.insert(name.into(), value.into());
        self
    }
}

/// Outcome of invoking an operation: the decoded response body, or a
/// structured failure. Execution never raises past the executor.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum InvocationResult {
    Success(Value),
    Failure(InvocationFailure),
}

impl InvocationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, InvocationResult::Success(_))
    }
}

/// Structured failure shape carried by [`InvocationResult::Failure`].
#[derive(Debug, Clone, Serialize)]
pub struct InvocationFailure {
    /// Human-readable failure description
    pub error: String,
    /// HTTP status code, when a response was received
    pub status_code: Option<u16>,
    /// Raw response text, when obtainable
    pub response_body: Option<String>,
}
