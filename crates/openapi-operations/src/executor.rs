//! Invocation execution: argument routing, auth injection, and the HTTP call

use indexmap::IndexMap;
use reqwest::Client;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, error};
use url::Url;

use crate::error::ValidationError;
use crate::types::{
    ApiKeyLocation, AuthContext, AuthRequirement, HttpMethod, InvocationFailure,
    InvocationResult, OperationSpec, ParameterLocation, SchemeKind,
};

/// Default per-call timeout, adjustable with [`Executor::with_timeout`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Executes compiled operations against their upstream API.
///
/// Holds only an HTTP client; one executor serves any number of concurrent
/// callers, and operations are stateless across invocations. Every runtime
/// problem after validation, timeouts included, resolves to an
/// [`InvocationResult::Failure`] rather than a fault.
pub struct Executor {
    client: Client,
}

impl Executor {
    /// Create an executor with the default timeout.
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create an executor with a custom per-call timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");
        Self { client }
    }

    /// Invoke one operation with caller-supplied arguments and auth context.
    ///
    /// Validation failures are returned as `Err` before any network attempt.
    /// Once validation passes the call always resolves to an
    /// [`InvocationResult`].
    pub async fn invoke(
        &self,
        operation: &OperationSpec,
        arguments: &Value,
        context: &AuthContext,
    ) -> Result<InvocationResult, ValidationError> {
        let supplied = operation.model.check(arguments)?;

        let mut headers: IndexMap<String, String> = IndexMap::new();
        let mut query: IndexMap<String, String> = IndexMap::new();
        let mut body = Map::new();
        let mut path = operation.path_template.clone();

        // Authentication material goes in first; a parameter routed below may
        // overwrite the same slot.
        for requirement in &operation.auth {
            apply_auth(requirement, context, &mut headers, &mut query);
        }

        for descriptor in &operation.parameters {
            let value = match supplied.get(&descriptor.name) {
                Some(value) => value,
                None => continue,
            };
            match descriptor.location {
                ParameterLocation::Query => {
                    query.insert(descriptor.name.clone(), stringify(value));
                }
                ParameterLocation::Header => {
                    headers.insert(descriptor.name.clone(), stringify(value));
                }
                ParameterLocation::Path => {
                    path = path.replace(&format!("{{{}}}", descriptor.name), &stringify(value));
                }
                ParameterLocation::Body => {
                    body.insert(descriptor.name.clone(), value.clone());
                }
            }
        }

        let url = match join_url(&operation.base_url, &path) {
            Ok(url) => url,
            Err(failure) => return Ok(InvocationResult::Failure(failure)),
        };

        let mut request = self.client.request(to_reqwest(operation.method), &url);
        if !query.is_empty() {
            let pairs: Vec<(&str, &str)> = query
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_str()))
                .collect();
            request = request.query(&pairs);
        }
        for (name, value) in &headers {
            request = request.header(name.as_str(), value.as_str());
        }
        // Body-located values on a non-body-bearing verb are dropped.
        if !body.is_empty() && operation.method.allows_body() {
            request = request.json(&Value::Object(body));
        }

        debug!("Invoking {} {}", operation.method, url);
        Ok(self.execute(operation, &url, request).await)
    }

    /// Execute the request, folding every failure into the structured shape.
    async fn execute(
        &self,
        operation: &OperationSpec,
        url: &str,
        request: reqwest::RequestBuilder,
    ) -> InvocationResult {
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                error!("{} {} failed: {}", operation.method, url, e);
                return InvocationResult::Failure(InvocationFailure {
                    error: e.to_string(),
                    status_code: e.status().map(|status| status.as_u16()),
                    response_body: None,
                });
            }
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                return InvocationResult::Failure(InvocationFailure {
                    error: format!("failed to read response: {}", e),
                    status_code: Some(status.as_u16()),
                    response_body: None,
                });
            }
        };

        if status.is_success() {
            let decoded = match serde_json::from_str::<Value>(&text) {
                Ok(json) => json,
                Err(_) => Value::String(text),
            };
            InvocationResult::Success(decoded)
        } else {
            error!("{} {} returned status {}", operation.method, url, status);
            InvocationResult::Failure(InvocationFailure {
                error: format!("HTTP {} from {}", status.as_u16(), url),
                status_code: Some(status.as_u16()),
                response_body: Some(text),
            })
        }
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}

/// Copy authentication material from the caller's context into the outgoing
/// request. A value missing from the context injects nothing: the
/// unauthenticated call is attempted and fails at the HTTP layer if the
/// target requires it.
fn apply_auth(
    requirement: &AuthRequirement,
    context: &AuthContext,
    headers: &mut IndexMap<String, String>,
    query: &mut IndexMap<String, String>,
) {
    match &requirement.descriptor.scheme {
        SchemeKind::ApiKey { name, location } => match location {
            ApiKeyLocation::Header => {
                if let Some(value) = context.headers.get(name) {
                    headers.insert(name.clone(), value.clone());
                }
            }
            ApiKeyLocation::Query => {
                if let Some(value) = context.query_params.get(name) {
                    query.insert(name.clone(), value.clone());
                }
            }
        },
        SchemeKind::OAuth2 { .. } => {
            if let Some(token) = context.headers.get("Authorization") {
                headers.insert("Authorization".to_string(), token.clone());
            }
        }
        SchemeKind::Http { scheme } if scheme == "bearer" => {
            if let Some(token) = context.headers.get("Authorization") {
                headers.insert("Authorization".to_string(), format!("Bearer {}", token));
            }
        }
        _ => {}
    }
}

/// Join the base URL and the substituted path template. An empty base leaves
/// the path untouched; an unparsable one becomes a structured failure.
fn join_url(base_url: &str, path: &str) -> Result<String, InvocationFailure> {
    if base_url.is_empty() {
        return Ok(path.to_string());
    }
    match Url::parse(base_url).and_then(|base| base.join(path)) {
        Ok(url) => Ok(url.to_string()),
        Err(e) => Err(InvocationFailure {
            error: format!("invalid URL '{}' + '{}': {}", base_url, path, e),
            status_code: None,
            response_body: None,
        }),
    }
}

/// Render a parameter value for a path, query, or header slot.
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn to_reqwest(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
        HttpMethod::Head => reqwest::Method::HEAD,
        HttpMethod::Options => reqwest::Method::OPTIONS,
        HttpMethod::Trace => reqwest::Method::TRACE,
    }
}
