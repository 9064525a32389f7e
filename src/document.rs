//! Document walking and reference resolution.
//!
//! [`ApiDocument`] is built once per conversion: it borrows the parsed
//! document, lists every operation under `paths`, and flattens every
//! second-level entry under `components` into one lookup table.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use crate::types::{ref_name, PathMethod, PATH_PARAMETERS_KEY};

/// Prefix for references the flattened table can answer.
pub const COMPONENTS_PREFIX: &str = "#/components/";

/// Read-only view of an OpenAPI 3 document.
#[derive(Debug, Clone)]
pub struct ApiDocument<'a> {
    document: &'a Value,
    path_methods: Vec<PathMethod<'a>>,
    references: IndexMap<String, &'a Value>,
}

impl<'a> ApiDocument<'a> {
    /// Walk `document`, collecting operations and component references.
    pub fn new(document: &'a Value) -> Self {
        Self {
            document,
            path_methods: collect_path_methods(document),
            references: collect_references(document),
        }
    }

    pub fn document(&self) -> &'a Value {
        self.document
    }

    pub fn path_methods(&self) -> &[PathMethod<'a>] {
        &self.path_methods
    }

    /// Flattened `#/components/{kind}/{name}` table, in document order.
    pub fn references(&self) -> &IndexMap<String, &'a Value> {
        &self.references
    }

    /// Reorder operations by path then method, and references by key.
    pub fn sort(&mut self) {
        self.path_methods
            .sort_by(|a, b| a.path.cmp(b.path).then_with(|| a.method.cmp(&b.method)));
        self.references.sort_keys();
    }

    /// Resolve a reference node against the flattened table.
    ///
    /// Non-reference nodes come back unchanged. References outside
    /// `#/components/` come back unresolved. `None` means the target is missing.
    pub fn resolve<'n>(&self, node: &'n Value) -> Option<&'n Value>
    where
        'a: 'n,
    {
        match ref_name(node) {
            None => Some(node),
            Some(target) => self.lookup(node, target),
        }
    }

    /// Like [`resolve`](Self::resolve), but records each reference entered.
    ///
    /// A reference already in `visited` comes back unresolved, so the caller
    /// renders its name instead of expanding it again.
    pub fn resolve_tracked<'n>(
        &self,
        node: &'n Value,
        visited: &mut BTreeSet<String>,
    ) -> Option<&'n Value>
    where
        'a: 'n,
    {
        let Some(target) = ref_name(node) else {
            return Some(node);
        };
        if visited.contains(target) {
            debug!(reference = target, "reference cycle");
            return Some(node);
        }
        visited.insert(target.to_string());
        self.lookup(node, target)
    }

    fn lookup<'n>(&self, node: &'n Value, target: &str) -> Option<&'n Value>
    where
        'a: 'n,
    {
        if !target.starts_with(COMPONENTS_PREFIX) {
            return Some(node);
        }
        if let Some(found) = self.references.get(target) {
            return Some(*found);
        }
        // Deeper pointers such as `#/components/schemas/Pet/properties/id`
        let found = self.document.pointer(&target[1..]);
        if found.is_none() {
            debug!(reference = target, "missing reference");
        }
        found
    }
}

fn collect_path_methods(document: &Value) -> Vec<PathMethod<'_>> {
    let Some(paths) = document.get("paths").and_then(Value::as_object) else {
        return Vec::new();
    };

    let mut path_methods = Vec::new();
    for (path, item) in paths {
        let Some(item) = item.as_object() else {
            continue;
        };
        for (method, operation) in item {
            // Shared path parameters aren't merged into operations.
            if method == PATH_PARAMETERS_KEY || !operation.is_object() {
                continue;
            }
            path_methods.push(PathMethod {
                path,
                method: method.to_uppercase(),
                operation,
            });
        }
    }
    path_methods
}

fn collect_references(document: &Value) -> IndexMap<String, &Value> {
    let mut references = IndexMap::new();
    let Some(components) = document.get("components").and_then(Value::as_object) else {
        return references;
    };

    for (kind, entries) in components {
        let Some(entries) = entries.as_object() else {
            continue;
        };
        for (name, value) in entries {
            references.insert(format!("{COMPONENTS_PREFIX}{kind}/{name}"), value);
        }
    }
    references
}
