//! Closed classification of schema nodes.
//!
//! A raw JSON value is inspected once and turned into a [`SchemaNode`]; the
//! renderer matches on the variant instead of probing keys again.

use serde_json::{Map, Value};

use crate::types::ref_name;

/// Composition keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Composition {
    AnyOf,
    OneOf,
    AllOf,
}

impl Composition {
    /// Keywords in dispatch priority order.
    pub const ALL: [Composition; 3] = [Composition::AnyOf, Composition::AllOf, Composition::OneOf];

    pub fn keyword(&self) -> &'static str {
        match self {
            Composition::AnyOf => "anyOf",
            Composition::OneOf => "oneOf",
            Composition::AllOf => "allOf",
        }
    }

    /// Join rendered branch names with this keyword's operator.
    ///
    /// `anyOf` wraps every branch as `Partial(..)` and intersects them.
    pub fn join<I>(&self, names: I) -> String
    where
        I: IntoIterator<Item = String>,
    {
        let (separator, partial) = match self {
            Composition::AllOf => (" & ", false),
            Composition::OneOf => (" | ", false),
            Composition::AnyOf => (" & ", true),
        };
        names
            .into_iter()
            .map(|name| {
                if partial {
                    format!("Partial({name})")
                } else {
                    name
                }
            })
            .collect::<Vec<_>>()
            .join(separator)
    }
}

/// Which children of an object are required.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Required<'a> {
    /// `required: [..]` lists field names.
    Fields(&'a [Value]),
    /// `required: true|false` applies to every child.
    All(bool),
}

impl Required<'_> {
    fn from_value(value: Option<&Value>) -> Required<'_> {
        match value {
            Some(Value::Array(fields)) => Required::Fields(fields),
            Some(Value::Bool(all)) => Required::All(*all),
            _ => Required::All(false),
        }
    }

    /// Whether the child named `name` is required.
    pub fn contains(&self, name: &str) -> bool {
        match self {
            Required::Fields(fields) => fields.iter().any(|f| f.as_str() == Some(name)),
            Required::All(all) => *all,
        }
    }
}

/// A schema node, classified by shape.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode<'a> {
    Reference {
        target: &'a str,
    },
    Object {
        properties: Option<&'a Map<String, Value>>,
        required: Required<'a>,
        description: Option<&'a str>,
    },
    Array {
        items: Option<&'a Value>,
    },
    Primitive {
        types: Vec<&'a str>,
        enumeration: Option<&'a [Value]>,
        default: Option<&'a Value>,
        description: Option<&'a str>,
    },
    Composition {
        kind: Composition,
        branches: &'a [Value],
        description: Option<&'a str>,
    },
    /// Nothing recognisable; rendered as a raw dump.
    Unknown(&'a Value),
}

impl<'a> SchemaNode<'a> {
    /// Classify a raw value.
    ///
    /// Priority: `$ref`, `type: object`, `type: array`, any other `type`,
    /// `anyOf`, `allOf`, `oneOf`, then untyped `properties` or `items`.
    pub fn classify(value: &'a Value) -> Self {
        if let Some(target) = ref_name(value) {
            return SchemaNode::Reference { target };
        }

        let description = value.get("description").and_then(Value::as_str);

        match value.get("type") {
            Some(Value::String(t)) if t == "object" => return Self::object(value, description),
            Some(Value::String(t)) if t == "array" => return Self::array(value),
            Some(ty) => {
                let types: Vec<&str> = match ty {
                    Value::String(t) => vec![t.as_str()],
                    Value::Array(ts) => ts.iter().filter_map(Value::as_str).collect(),
                    _ => Vec::new(),
                };
                if !types.is_empty() {
                    return SchemaNode::Primitive {
                        types,
                        enumeration: value.get("enum").and_then(Value::as_array).map(Vec::as_slice),
                        default: value.get("default"),
                        description,
                    };
                }
            }
            None => {}
        }

        for kind in Composition::ALL {
            if let Some(branches) = value.get(kind.keyword()).and_then(Value::as_array) {
                return SchemaNode::Composition {
                    kind,
                    branches,
                    description,
                };
            }
        }

        if value.get("properties").is_some_and(Value::is_object) {
            return Self::object(value, description);
        }
        if value.get("items").is_some() {
            return Self::array(value);
        }

        SchemaNode::Unknown(value)
    }

    fn object(value: &'a Value, description: Option<&'a str>) -> Self {
        SchemaNode::Object {
            properties: value.get("properties").and_then(Value::as_object),
            required: Required::from_value(value.get("required")),
            description,
        }
    }

    fn array(value: &'a Value) -> Self {
        SchemaNode::Array {
            items: value.get("items"),
        }
    }

    /// Whether the tree renderer should handle this node as a schema block.
    pub fn is_structured(&self) -> bool {
        matches!(
            self,
            SchemaNode::Object { .. } | SchemaNode::Array { .. } | SchemaNode::Composition { .. }
        )
    }
}
