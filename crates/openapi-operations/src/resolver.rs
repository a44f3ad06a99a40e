//! Internal reference resolution against a loaded document

use serde_json::Value;
use std::collections::HashSet;

use crate::error::{LoadError, LoadResult};

/// Resolves `#/a/b/c` references against the root of a loaded document.
///
/// Resolution happens at the point of use (parameter, schema, body, property)
/// rather than by pre-flattening the document; a failure stays localized to
/// the field being processed. No caching.
pub(crate) struct RefResolver<'a> {
    root: &'a Value,
}

impl<'a> RefResolver<'a> {
    pub fn new(root: &'a Value) -> Self {
        Self { root }
    }

    /// Follow a reference string to the sub-structure it names.
    ///
    /// Chained references are followed until a non-reference node is reached.
    /// A chain that revisits a reference fails with
    /// [`LoadError::ReferenceCycle`] instead of looping forever.
    pub fn resolve(&self, reference: &str) -> LoadResult<&'a Value> {
        let mut visited = HashSet::new();
        let mut current = reference;
        loop {
            if !visited.insert(current.to_string()) {
                return Err(LoadError::ReferenceCycle(current.to_string()));
            }
            let node = self.lookup(current)?;
            match node.get("$ref").and_then(Value::as_str) {
                Some(next) => current = next,
                None => return Ok(node),
            }
        }
    }

    /// Resolve a node's own `$ref` at the point of use, or return it unchanged.
    pub fn deref(&self, node: &'a Value) -> LoadResult<&'a Value> {
        match node.get("$ref").and_then(Value::as_str) {
            Some(reference) => self.resolve(reference),
            None => Ok(node),
        }
    }

    /// Walk one pointer path from the document root. The leading `#` segment
    /// is skipped; a missing segment fails with the original reference string.
    fn lookup(&self, reference: &str) -> LoadResult<&'a Value> {
        let mut current = self.root;
        for segment in reference.split('/').skip(1) {
            current = current
                .get(segment)
                .ok_or_else(|| LoadError::Reference(reference.to_string()))?;
        }
        Ok(current)
    }
}
