//! OpenAPI to Markdown
//!
//! Renders an OpenAPI v3 document (or a Swagger v2 document, upgraded first)
//! as Markdown reference documentation: a path table, a reference table,
//! per-operation details and a schema appendix.
//!
//! # Example
//!
//! ```
//! use openapi_md::{render_schema, ApiDocument};
//! use serde_json::json;
//!
//! let document = json!({
//!     "openapi": "3.0.0",
//!     "info": { "title": "Pets", "version": "1.0.0" },
//!     "paths": {},
//!     "components": {
//!         "schemas": {
//!             "Pet": {
//!                 "type": "object",
//!                 "required": ["id"],
//!                 "properties": {
//!                     "id": { "type": "integer" },
//!                     "tags": { "type": "array", "items": { "type": "string" } }
//!                 }
//!             }
//!         }
//!     }
//! });
//!
//! let api = ApiDocument::new(&document);
//! let pet = json!({ "$ref": "#/components/schemas/Pet" });
//! let text = render_schema(&api, Some("pet"), &pet, true);
//!
//! assert_eq!(
//!     text,
//!     "// #/components/schemas/Pet\npet: {\n  id: integer\n  tags?: string[]\n}\n"
//! );
//! ```
//!
//! # Type Expressions
//!
//! | Schema | Rendered as |
//! |--------|-------------|
//! | `{"type": "string"}` | `name?: string` |
//! | `{"type": "array", "items": ..}` | item type followed by `[]` |
//! | `{"allOf": [A, B]}` | `A & B` |
//! | `{"oneOf": [A, B]}` | `A \| B` |
//! | `{"anyOf": [A, B]}` | `Partial(A) & Partial(B)` |
//! | `$ref` seen again on the same path | the reference string |
//!
//! A field is shown without `?` when its parent's `required` list names it,
//! or when the parent has `required: true`.

mod document;
mod error;
mod loader;
mod markdown;
mod node;
mod render;
mod types;
mod upgrade;

pub use document::{ApiDocument, COMPONENTS_PREFIX};
pub use error::{ConvertError, LoadError, UpgradeError};
pub use loader::{is_url, load_document, load_source, parse_document, read_file};
pub use markdown::{anchor, convert, convert_source, render_markdown};
pub use node::{Composition, Required, SchemaNode};
pub use render::{render_schema, render_with, RenderContext};
pub use types::{json_type_name, ref_name, ConvertOptions, DocumentInfo, PathMethod};
pub use upgrade::{needs_upgrade, upgrade};

#[cfg(feature = "remote")]
pub use loader::fetch_url;
