//! Document loading: parse, normalize, and compile an OpenAPI document

use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::auth::extract_schemes;
use crate::compiler::compile_document;
use crate::error::{LoadError, LoadResult};
use crate::types::OperationSpec;

/// Top-level entry point: parses a document, extracts its security schemes
/// once, compiles every operation once, and returns the compiled set.
///
/// The raw document only lives for the duration of compilation; compiled
/// operations retain what they need and nothing else. Compilation is
/// single-pass and synchronous, and loading the same document twice yields
/// equivalent sets.
pub struct DocumentLoader;

impl DocumentLoader {
    /// Load a document from a string (auto-detects JSON/YAML).
    pub fn load_str(content: &str) -> LoadResult<OperationSet> {
        let document: Value = if content.trim_start().starts_with('{') {
            serde_json::from_str(content)?
        } else {
            serde_yaml::from_str(content)?
        };
        Self::compile(document)
    }

    /// Load a document from a file.
    pub fn load_file(path: impl AsRef<Path>) -> LoadResult<OperationSet> {
        debug!("Loading document from {}", path.as_ref().display());
        let content = std::fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Fetch and load a document from a URL.
    pub async fn fetch(url: &str) -> LoadResult<OperationSet> {
        info!("Fetching document from {}", url);

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| LoadError::Fetch(e.to_string()))?;

        let response = client
            .get(url)
            .header("Accept", "application/json, application/yaml, text/yaml")
            .send()
            .await
            .map_err(|e| LoadError::Fetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LoadError::Fetch(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        let content = response
            .text()
            .await
            .map_err(|e| LoadError::Fetch(e.to_string()))?;

        Self::load_str(&content)
    }

    fn compile(document: Value) -> LoadResult<OperationSet> {
        if !document.is_object() {
            return Err(LoadError::Document(
                "document root must be a mapping".to_string(),
            ));
        }

        let document = normalize_booleans(document);
        let schemes = extract_schemes(&document);
        let operations = compile_document(&document, &schemes)?;
        info!("Compiled {} operations", operations.len());

        Ok(OperationSet { operations })
    }
}

/// Coerce `"true"`/`"false"` string literals anywhere in the document to real
/// booleans before use. Loosely-typed sources encode booleans as strings.
fn normalize_booleans(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key, normalize_booleans(value)))
                .collect(),
        ),
        Value::Array(items) => {
            Value::Array(items.into_iter().map(normalize_booleans).collect())
        }
        Value::String(s) => {
            if s.eq_ignore_ascii_case("true") {
                Value::Bool(true)
            } else if s.eq_ignore_ascii_case("false") {
                Value::Bool(false)
            } else {
                Value::String(s)
            }
        }
        other => other,
    }
}

/// The compiled operation set. Ordered and immutable; safe for concurrent
/// read-only use by any number of callers.
#[derive(Debug, Clone)]
pub struct OperationSet {
    operations: Vec<Arc<OperationSpec>>,
}

impl OperationSet {
    /// Number of compiled operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Look up an operation by its derived name.
    pub fn get(&self, name: &str) -> Option<&Arc<OperationSpec>> {
        self.operations.iter().find(|op| op.name == name)
    }

    /// Derived names, in compiled order.
    pub fn names(&self) -> Vec<String> {
        self.operations.iter().map(|op| op.name.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<OperationSpec>> {
        self.operations.iter()
    }

    pub fn operations(&self) -> &[Arc<OperationSpec>] {
        &self.operations
    }

    /// Discovery projection for the serving layer: one
    /// `{name, description, input_schema, auth}` entry per operation, in
    /// compiled order.
    pub fn listing(&self) -> Value {
        Value::Array(self.operations.iter().map(|op| op.listing_entry()).collect())
    }
}
