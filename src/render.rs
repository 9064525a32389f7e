//! Schema tree rendering.
//!
//! Turns a schema node into an indented pseudo type declaration:
//!
//! ```text
//! // #/components/schemas/Pet
//! pet: {
//!   id: integer
//!   tags?: string[]
//!   owner?: #/components/schemas/Owner & Partial(#/components/schemas/Audit)
//! }
//! ```
//!
//! Every top-level call starts with a fresh [`RenderContext`]. A reference
//! that is already being expanded on the current path renders as its name.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::document::ApiDocument;
use crate::node::SchemaNode;
use crate::types::ref_name;

/// Indentation unit, one per nesting level.
const INDENT: &str = "  ";

/// Per-call render state: nesting level and the references entered so far.
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    level: usize,
    visited: BTreeSet<String>,
    inline: bool,
    // Enclosing arrays whose `[]` the element's type carries.
    arrays: usize,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    fn indent(&self) -> String {
        INDENT.repeat(self.level)
    }

    fn child(&self) -> Self {
        Self {
            level: self.level + 1,
            visited: self.visited.clone(),
            inline: false,
            arrays: 0,
        }
    }

    // Continues the current line inside a composition; no comment lines.
    fn inline(&self) -> Self {
        Self {
            inline: true,
            arrays: 0,
            ..self.clone()
        }
    }

    fn element(&self) -> Self {
        Self {
            arrays: self.arrays + 1,
            ..self.clone()
        }
    }

    fn array_suffix(&self) -> String {
        "[]".repeat(self.arrays)
    }
}

/// Render `node` as a declaration named `name`.
///
/// `required` drops the `?` marker from the declaration. Missing references
/// render as an empty string.
pub fn render_schema(doc: &ApiDocument, name: Option<&str>, node: &Value, required: bool) -> String {
    render_with(doc, name, node, required, RenderContext::new())
}

/// Render with explicit context; see [`render_schema`].
pub fn render_with(
    doc: &ApiDocument,
    name: Option<&str>,
    node: &Value,
    required: bool,
    mut ctx: RenderContext,
) -> String {
    let Some(resolved) = resolve_chain(doc, node, &mut ctx.visited) else {
        return String::new();
    };
    let indent = ctx.indent();
    let suffix = ctx.array_suffix();

    match SchemaNode::classify(resolved) {
        SchemaNode::Reference { target } => match name {
            Some(name) => format!("{indent}{name}: {target}{suffix}\n"),
            None => format!("{target}{suffix}\n"),
        },

        SchemaNode::Object {
            properties,
            required: fields,
            description,
        } => {
            let mut out = comment(node, description, &ctx);
            match name {
                Some(name) => out.push_str(&format!("{indent}{name}: {{\n")),
                None => out.push_str("{\n"),
            }
            for (key, property) in properties.into_iter().flatten() {
                let child_required = fields.contains(key);
                out.push_str(&render_with(
                    doc,
                    Some(key.as_str()),
                    property,
                    child_required,
                    ctx.child(),
                ));
            }
            out.push_str(&format!("{indent}}}{suffix}\n"));
            out
        }

        // The element renders under the same name and level, its type
        // followed by one `[]` per enclosing array.
        SchemaNode::Array { items } => {
            let element_ctx = ctx.element();
            let element = match items {
                Some(items) => {
                    let element = render_with(doc, name, items, required, element_ctx);
                    if element.is_empty() {
                        return String::new();
                    }
                    element
                }
                None => format!(
                    "{}any{}\n",
                    declaration(name, required, &indent),
                    element_ctx.array_suffix()
                ),
            };
            let mut out = comment(node, None, &ctx);
            out.push_str(&element);
            out
        }

        SchemaNode::Primitive {
            types,
            enumeration,
            default,
            description,
        } => {
            let mut out = comment(node, description, &ctx);
            out.push_str(&declaration(name, required, &indent));
            match enumeration {
                Some(values) => out.push_str(&enum_display(values)),
                None => out.push_str(&types.join(" | ")),
            }
            out.push_str(&suffix);
            if let Some(default) = default {
                out.push_str(&format!(" //default: {}", display_value(default)));
            }
            out.push('\n');
            out
        }

        SchemaNode::Composition {
            kind,
            branches,
            description,
        } => {
            let mut out = comment(node, description, &ctx);
            out.push_str(&declaration(name, required, &indent));
            out.push_str(&kind.join(branches.iter().map(|b| branch_type(doc, b, &ctx))));
            out.push_str(&suffix);
            out.push('\n');
            out
        }

        SchemaNode::Unknown(value) => {
            let mut out = comment(node, None, &ctx);
            out.push_str(&declaration(name, required, &indent));
            out.push_str(&value.to_string());
            out.push_str(&suffix);
            out.push('\n');
            out
        }
    }
}

/// Follow `$ref` hops until a non-reference, a cycle, or a miss.
fn resolve_chain<'n>(
    doc: &ApiDocument<'n>,
    node: &'n Value,
    visited: &mut BTreeSet<String>,
) -> Option<&'n Value> {
    let mut current = node;
    loop {
        let next = doc.resolve_tracked(current, visited)?;
        if std::ptr::eq(next, current) || ref_name(next).is_none() {
            return Some(next);
        }
        current = next;
    }
}

/// Short type name for one composition branch.
fn branch_type(doc: &ApiDocument, branch: &Value, ctx: &RenderContext) -> String {
    match SchemaNode::classify(branch) {
        SchemaNode::Reference { target } => target.to_string(),
        SchemaNode::Object { .. } | SchemaNode::Array { .. } => {
            render_with(doc, None, branch, false, ctx.inline())
                .trim_end()
                .to_string()
        }
        SchemaNode::Primitive {
            types, enumeration, ..
        } => match enumeration {
            Some(values) => enum_display(values),
            None => types.join(" | "),
        },
        SchemaNode::Composition { kind, branches, .. } => format!(
            "({})",
            kind.join(branches.iter().map(|b| branch_type(doc, b, ctx)))
        ),
        SchemaNode::Unknown(value) => value.to_string(),
    }
}

/// `name: ` or `name?: `; empty for anonymous nodes that continue a line.
fn declaration(name: Option<&str>, required: bool, indent: &str) -> String {
    match name {
        Some(name) => format!("{indent}{name}{}: ", if required { "" } else { "?" }),
        None => String::new(),
    }
}

/// Comment lines for a node: its `$ref` if it was one, else its description.
fn comment(original: &Value, description: Option<&str>, ctx: &RenderContext) -> String {
    if ctx.inline {
        return String::new();
    }
    let indent = ctx.indent();
    if let Some(target) = ref_name(original) {
        return format!("{indent}// {target}\n");
    }
    description
        .map(|text| {
            text.lines()
                .map(|line| format!("{indent}// {line}\n"))
                .collect()
        })
        .unwrap_or_default()
}

fn enum_display(values: &[Value]) -> String {
    let values: Vec<String> = values.iter().map(display_value).collect();
    format!("enum[{}]", values.join(", "))
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn doc_with(schemas: Value) -> Value {
        json!({
            "openapi": "3.0.0",
            "paths": {},
            "components": { "schemas": schemas }
        })
    }

    fn schema_ref(name: &str) -> Value {
        json!({ "$ref": format!("#/components/schemas/{name}") })
    }

    #[test]
    fn object_required_list() {
        let doc = doc_with(json!({}));
        let api = ApiDocument::new(&doc);
        let node = json!({
            "type": "object",
            "required": ["id"],
            "properties": {
                "id": { "type": "integer" },
                "name": { "type": "string" }
            }
        });

        assert_eq!(
            render_schema(&api, Some("pet"), &node, false),
            "pet: {\n  id: integer\n  name?: string\n}\n"
        );
    }

    #[test]
    fn object_required_boolean() {
        let doc = doc_with(json!({}));
        let api = ApiDocument::new(&doc);
        let all = json!({
            "type": "object",
            "required": true,
            "properties": { "a": { "type": "string" }, "b": { "type": "integer" } }
        });
        let none = json!({
            "type": "object",
            "required": false,
            "properties": { "a": { "type": "string" } }
        });

        assert_eq!(
            render_schema(&api, Some("obj"), &all, false),
            "obj: {\n  a: string\n  b: integer\n}\n"
        );
        assert_eq!(
            render_schema(&api, Some("obj"), &none, false),
            "obj: {\n  a?: string\n}\n"
        );
    }

    #[test]
    fn required_recomputed_per_level() {
        let doc = doc_with(json!({}));
        let api = ApiDocument::new(&doc);
        let node = json!({
            "type": "object",
            "required": ["child"],
            "properties": {
                "child": {
                    "type": "object",
                    "properties": { "leaf": { "type": "string" } }
                }
            }
        });

        assert_eq!(
            render_schema(&api, Some("root"), &node, true),
            "root: {\n  child: {\n    leaf?: string\n  }\n}\n"
        );
    }

    #[test]
    fn reference_comment_wins_over_description() {
        let doc = doc_with(json!({
            "Pet": {
                "type": "object",
                "description": "A pet",
                "properties": { "id": { "type": "integer" } }
            }
        }));
        let api = ApiDocument::new(&doc);

        assert_eq!(
            render_schema(&api, Some("pet"), &schema_ref("Pet"), true),
            "// #/components/schemas/Pet\npet: {\n  id?: integer\n}\n"
        );
    }

    #[test]
    fn multiline_description_comment() {
        let doc = doc_with(json!({}));
        let api = ApiDocument::new(&doc);
        let node = json!({
            "type": "object",
            "properties": {
                "note": { "type": "string", "description": "line one\nline two" }
            }
        });

        assert_eq!(
            render_schema(&api, Some("obj"), &node, false),
            "obj: {\n  // line one\n  // line two\n  note?: string\n}\n"
        );
    }

    #[test]
    fn direct_self_reference_terminates() {
        let doc = doc_with(json!({
            "Node": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "parent": { "$ref": "#/components/schemas/Node" }
                }
            }
        }));
        let api = ApiDocument::new(&doc);

        assert_eq!(
            render_schema(&api, Some("node"), &schema_ref("Node"), false),
            "// #/components/schemas/Node\nnode: {\n  name?: string\n  parent: #/components/schemas/Node\n}\n"
        );
    }

    #[test]
    fn indirect_cycle_terminates() {
        let doc = doc_with(json!({
            "A": { "type": "object", "properties": { "b": { "$ref": "#/components/schemas/B" } } },
            "B": { "type": "object", "properties": { "a": { "$ref": "#/components/schemas/A" } } }
        }));
        let api = ApiDocument::new(&doc);

        assert_eq!(
            render_schema(&api, Some("a"), &schema_ref("A"), false),
            "// #/components/schemas/A\na: {\n  // #/components/schemas/B\n  b: {\n    a: #/components/schemas/A\n  }\n}\n"
        );
    }

    #[test]
    fn siblings_expand_shared_reference() {
        let doc = doc_with(json!({
            "Tag": { "type": "string", "description": "label" }
        }));
        let api = ApiDocument::new(&doc);
        let node = json!({
            "type": "object",
            "properties": {
                "first": { "$ref": "#/components/schemas/Tag" },
                "second": { "$ref": "#/components/schemas/Tag" }
            }
        });

        assert_eq!(
            render_schema(&api, Some("pair"), &node, false),
            "pair: {\n  // #/components/schemas/Tag\n  first?: string\n  // #/components/schemas/Tag\n  second?: string\n}\n"
        );
    }

    #[test]
    fn array_of_primitive() {
        let doc = doc_with(json!({}));
        let api = ApiDocument::new(&doc);
        let node = json!({ "type": "array", "items": { "type": "string" } });

        assert_eq!(render_schema(&api, Some("tags"), &node, false), "tags?: string[]\n");
        assert_eq!(render_schema(&api, Some("tags"), &node, true), "tags: string[]\n");
        assert_eq!(render_schema(&api, None, &node, false), "string[]\n");
    }

    #[test]
    fn array_of_referenced_object() {
        let doc = doc_with(json!({
            "Tag": { "type": "object", "properties": { "label": { "type": "string" } } }
        }));
        let api = ApiDocument::new(&doc);
        let node = json!({ "type": "array", "items": { "$ref": "#/components/schemas/Tag" } });

        assert_eq!(
            render_schema(&api, Some("tags"), &node, false),
            "// #/components/schemas/Tag\ntags: {\n  label?: string\n}[]\n"
        );
    }

    #[test]
    fn array_suffix_precedes_default() {
        let doc = doc_with(json!({}));
        let api = ApiDocument::new(&doc);
        let tags = json!({ "type": "array", "items": { "type": "string", "default": "a" } });
        let modes = json!({
            "type": "array",
            "items": { "type": "string", "enum": ["a", "b"], "default": "a" }
        });
        let grid = json!({
            "type": "array",
            "items": { "type": "array", "items": { "type": "integer", "default": 0 } }
        });

        assert_eq!(
            render_schema(&api, Some("tags"), &tags, false),
            "tags?: string[] //default: a\n"
        );
        assert_eq!(
            render_schema(&api, Some("modes"), &modes, true),
            "modes: enum[a, b][] //default: a\n"
        );
        assert_eq!(
            render_schema(&api, Some("grid"), &grid, false),
            "grid?: integer[][] //default: 0\n"
        );
    }

    #[test]
    fn array_without_items() {
        let doc = doc_with(json!({}));
        let api = ApiDocument::new(&doc);
        let node = json!({ "type": "array" });

        assert_eq!(render_schema(&api, Some("list"), &node, false), "list?: any[]\n");
    }

    #[test]
    fn compositions_of_references() {
        let doc = doc_with(json!({ "A": { "type": "object" }, "B": { "type": "object" } }));
        let api = ApiDocument::new(&doc);
        let branches = json!([schema_ref("A"), schema_ref("B")]);

        let any_of = json!({ "anyOf": branches });
        let all_of = json!({ "allOf": branches });
        let one_of = json!({ "oneOf": branches });

        assert_eq!(
            render_schema(&api, Some("pet"), &any_of, false),
            "pet?: Partial(#/components/schemas/A) & Partial(#/components/schemas/B)\n"
        );
        assert_eq!(
            render_schema(&api, Some("pet"), &all_of, false),
            "pet?: #/components/schemas/A & #/components/schemas/B\n"
        );
        assert_eq!(
            render_schema(&api, Some("pet"), &one_of, true),
            "pet: #/components/schemas/A | #/components/schemas/B\n"
        );
    }

    #[test]
    fn composition_with_inline_branches() {
        let doc = doc_with(json!({}));
        let api = ApiDocument::new(&doc);
        let node = json!({
            "description": "Either",
            "oneOf": [
                {
                    "type": "object",
                    "description": "not shown inline",
                    "properties": { "id": { "type": "integer" } }
                },
                { "type": "string" },
                { "type": "array", "items": { "type": "integer" } }
            ]
        });

        assert_eq!(
            render_schema(&api, Some("value"), &node, true),
            "// Either\nvalue: {\n  id?: integer\n} | string | integer[]\n"
        );
    }

    #[test]
    fn enum_branch_shows_values() {
        let doc = doc_with(json!({}));
        let api = ApiDocument::new(&doc);
        let node = json!({
            "oneOf": [
                { "type": "string", "enum": ["asc", "desc"] },
                { "type": "integer" }
            ]
        });

        assert_eq!(
            render_schema(&api, Some("order"), &node, false),
            "order?: enum[asc, desc] | integer\n"
        );
    }

    #[test]
    fn nested_composition_is_parenthesised() {
        let doc = doc_with(json!({}));
        let api = ApiDocument::new(&doc);
        let node = json!({
            "allOf": [
                { "type": "string" },
                { "oneOf": [{ "type": "integer" }, { "type": "boolean" }] }
            ]
        });

        assert_eq!(
            render_schema(&api, Some("v"), &node, false),
            "v?: string & (integer | boolean)\n"
        );
    }

    #[test]
    fn enum_and_default() {
        let doc = doc_with(json!({}));
        let api = ApiDocument::new(&doc);
        let order = json!({ "type": "string", "enum": ["asc", "desc"], "default": "asc" });
        let flag = json!({ "type": "boolean", "default": false });
        let count = json!({ "type": ["integer", "null"], "default": 0 });

        assert_eq!(
            render_schema(&api, Some("order"), &order, false),
            "order?: enum[asc, desc] //default: asc\n"
        );
        assert_eq!(
            render_schema(&api, Some("flag"), &flag, false),
            "flag?: boolean //default: false\n"
        );
        assert_eq!(
            render_schema(&api, Some("count"), &count, true),
            "count: integer | null //default: 0\n"
        );
    }

    #[test]
    fn missing_reference_renders_empty() {
        let doc = doc_with(json!({}));
        let api = ApiDocument::new(&doc);
        let node = json!({
            "type": "object",
            "properties": {
                "gone": { "$ref": "#/components/schemas/Nope" },
                "kept": { "type": "string" },
                "list": { "type": "array", "items": { "$ref": "#/components/schemas/Nope" } }
            }
        });

        assert_eq!(render_schema(&api, Some("x"), &schema_ref("Nope"), false), "");
        assert_eq!(
            render_schema(&api, Some("obj"), &node, false),
            "obj: {\n  kept?: string\n}\n"
        );
    }

    #[test]
    fn unknown_shape_dumps_raw() {
        let doc = doc_with(json!({}));
        let api = ApiDocument::new(&doc);
        let node = json!({
            "type": "object",
            "properties": { "extra": { "description": "free" } }
        });

        assert_eq!(
            render_schema(&api, Some("obj"), &node, false),
            "obj: {\n  extra?: {\"description\":\"free\"}\n}\n"
        );
    }

    #[test]
    fn reference_chain_is_followed() {
        let doc = doc_with(json!({
            "Alias": { "$ref": "#/components/schemas/Real" },
            "Real": { "type": "integer" }
        }));
        let api = ApiDocument::new(&doc);

        assert_eq!(
            render_schema(&api, Some("n"), &schema_ref("Alias"), false),
            "// #/components/schemas/Alias\nn?: integer\n"
        );
    }

    #[test]
    fn fresh_context_expands_self_reference_once() {
        let doc = doc_with(json!({
            "Node": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "parent": { "$ref": "#/components/schemas/Node" }
                }
            }
        }));
        let api = ApiDocument::new(&doc);
        let node = &doc["components"]["schemas"]["Node"];

        assert_eq!(
            render_with(&api, None, node, false, RenderContext::new()),
            "{\n  name?: string\n  // #/components/schemas/Node\n  parent: {\n    name?: string\n    parent: #/components/schemas/Node\n  }\n}\n"
        );
    }

    #[test]
    fn rendering_is_deterministic() {
        let doc = doc_with(json!({
            "Pet": {
                "type": "object",
                "required": ["id"],
                "properties": {
                    "id": { "type": "integer" },
                    "kind": { "oneOf": [{ "type": "string" }, { "$ref": "#/components/schemas/Pet" }] }
                }
            }
        }));
        let api = ApiDocument::new(&doc);

        let first = render_schema(&api, None, &schema_ref("Pet"), false);
        let second = render_schema(&api, None, &schema_ref("Pet"), false);
        assert_eq!(first, second);
    }
}
