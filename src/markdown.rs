//! Markdown assembly.
//!
//! Output layout: title header, path table, reference table, one detail
//! block per operation, then the reference appendix.

use serde_json::Value;
use tracing::info;

use crate::document::ApiDocument;
use crate::error::ConvertError;
use crate::loader::load_document;
use crate::node::SchemaNode;
use crate::render::render_schema;
use crate::types::{ref_name, ConvertOptions, DocumentInfo, PathMethod};
use crate::upgrade::{needs_upgrade, upgrade};

/// Characters dropped when building an anchor.
const ANCHOR_STRIPPED: &str = "!@#$%^&*()+|~=`[]{};':\",./<>?";

/// Parameter locations in display order, with their section headings.
const PARAMETER_GROUPS: &[(&str, &str)] = &[
    ("path", "Parameters(Path)"),
    ("query", "Parameters(Query)"),
    ("body", "Parameters(Body)"),
    ("header", "Headers"),
    ("cookie", "Cookies"),
];

/// Load, upgrade if needed, and convert a source file or URL.
///
/// # Errors
///
/// Returns `ConvertError` if the source can't be loaded or parsed, or if it
/// is neither OpenAPI 3 nor Swagger 2.
pub fn convert_source(source: &str, options: &ConvertOptions) -> Result<String, ConvertError> {
    let document = load_document(source)?;
    let document = if needs_upgrade(&document) {
        upgrade(&document)?
    } else {
        document
    };
    Ok(convert(&document, options))
}

/// Convert a parsed OpenAPI 3 document to Markdown.
pub fn convert(document: &Value, options: &ConvertOptions) -> String {
    let mut api = ApiDocument::new(document);
    if options.sort {
        api.sort();
    }
    let output = render_markdown(&api);
    info!(
        operations = api.path_methods().len(),
        references = api.references().len(),
        "rendered markdown"
    );
    output
}

/// Assemble the full document; trailing whitespace is trimmed.
pub fn render_markdown(api: &ApiDocument) -> String {
    let mut output = path_table(api);
    output.push_str(&reference_table(api));
    output.push_str(&path_details(api));
    output.push_str(&reference_appendix(api));
    output.trim_end().to_string()
}

/// Anchor fragment for a heading: punctuation stripped, spaces to hyphens, lower case.
pub fn anchor(text: &str) -> String {
    text.chars()
        .filter(|c| !ANCHOR_STRIPPED.contains(*c))
        .map(|c| if c == ' ' { '-' } else { c })
        .collect::<String>()
        .to_lowercase()
}

/// Markdown line breaks need two trailing spaces.
fn markdown_text(text: &str) -> String {
    text.replace('\n', "  \n")
}

fn table_cell(text: &str) -> String {
    text.replace('|', "\\|")
        .replace("\r\n", "\n")
        .replace('\n', "<br>")
}

fn str_field<'v>(value: &'v Value, key: &str) -> Option<&'v str> {
    value.get(key).and_then(Value::as_str)
}

fn json_block(value: &Value) -> String {
    let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    format!("```json\n{pretty}\n```\n\n")
}

fn path_table(api: &ApiDocument) -> String {
    let info = DocumentInfo::from_document(api.document());
    let mut out = format!("# {}\n\n> Version {}\n", info.title(), info.version());
    if let Some(description) = info.description() {
        out.push_str(&format!("\n{description}\n"));
    }
    out.push_str("\n## Path Table\n\n| Method | Path | Description |\n| --- | --- | --- |\n");

    for PathMethod {
        path,
        method,
        operation,
    } in api.path_methods()
    {
        out.push_str(&format!(
            "| {method} | [{path}](#{}{}) | {} |\n",
            method.to_lowercase(),
            anchor(path),
            table_cell(str_field(operation, "summary").unwrap_or_default())
        ));
    }
    out.push('\n');
    out
}

fn reference_table(api: &ApiDocument) -> String {
    let mut out = String::from("## Reference Table\n\n| Name | Path | Description |\n| --- | --- | --- |\n");

    for (key, value) in api.references() {
        let name = key.rsplit('/').next().unwrap_or(key);
        let description = api
            .resolve(value)
            .and_then(|v| str_field(v, "description"))
            .unwrap_or_default();
        out.push_str(&format!(
            "| {name} | [{key}](#{}) | {} |\n",
            anchor(key),
            table_cell(description)
        ));
    }
    out.push('\n');
    out
}

fn path_details(api: &ApiDocument) -> String {
    let mut out = String::from("## Path Details\n\n");

    for PathMethod {
        path,
        method,
        operation,
    } in api.path_methods()
    {
        out.push_str(&format!("***\n\n### [{method}]{path}\n\n"));

        if let Some(summary) = str_field(operation, "summary") {
            out.push_str(&format!("- Summary  \n{}\n\n", markdown_text(summary)));
        }
        if let Some(description) = str_field(operation, "description") {
            out.push_str(&format!("- Description  \n{}\n\n", markdown_text(description)));
        }
        if let Some(security) = operation.get("security").and_then(Value::as_array) {
            out.push_str(&security_section(security));
        }
        if let Some(parameters) = operation.get("parameters").and_then(Value::as_array) {
            out.push_str(&parameters_section(api, parameters));
        }
        if let Some(body) = operation.get("requestBody") {
            out.push_str("#### RequestBody\n\n");
            out.push_str(&schema_section(api, body));
        }
        if let Some(responses) = operation.get("responses") {
            out.push_str(&responses_section(api, responses));
        }
    }
    out
}

fn security_section(requirements: &[Value]) -> String {
    let names: Vec<String> = requirements
        .iter()
        .filter_map(Value::as_object)
        .filter(|requirement| !requirement.is_empty())
        .map(|requirement| {
            requirement
                .keys()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        })
        .collect();
    if names.is_empty() {
        return String::new();
    }

    let mut lines = names.join("\n");
    lines.push('\n');
    format!("- Security  \n{}\n", markdown_text(&lines))
}

fn parameters_section(api: &ApiDocument, parameters: &[Value]) -> String {
    let resolved: Vec<&Value> = parameters.iter().filter_map(|p| api.resolve(p)).collect();

    let mut out = String::new();
    for (location, heading) in PARAMETER_GROUPS {
        let group: Vec<&Value> = resolved
            .iter()
            .copied()
            .filter(|p| str_field(p, "in") == Some(*location))
            .collect();
        if group.is_empty() {
            continue;
        }
        out.push_str(&format!("#### {heading}\n\n"));
        for parameter in group {
            out.push_str(&schema_section(api, parameter));
        }
    }
    out
}

fn responses_section(api: &ApiDocument, responses: &Value) -> String {
    let Some(responses) = api.resolve(responses).and_then(Value::as_object) else {
        return String::new();
    };

    let mut out = String::from("#### Responses\n\n");
    for (code, response) in responses {
        let Some(response) = api.resolve(response) else {
            continue;
        };
        match str_field(response, "description").filter(|d| !d.is_empty()) {
            Some(description) => out.push_str(&format!("- {code} {description}\n\n")),
            None => out.push_str(&format!("- {code}\n\n")),
        }

        let Some(content) = response.get("content").and_then(Value::as_object) else {
            continue;
        };
        for (media_type, media) in content {
            out.push_str(&format!("`{media_type}`\n\n"));
            if let Some(schema) = media.get("schema") {
                out.push_str(&schema_section(api, schema));
            }
            out.push_str(&examples_section(api, media));
        }
    }
    out
}

fn examples_section(api: &ApiDocument, media: &Value) -> String {
    let mut out = String::new();
    if let Some(example) = media.get("example") {
        out.push_str("- Example\n\n");
        out.push_str(&json_block(example));
    }

    let examples = media
        .get("examples")
        .and_then(|e| api.resolve(e))
        .and_then(Value::as_object);
    if let Some(examples) = examples {
        out.push_str("- Examples\n\n");
        for (name, example) in examples {
            let Some(example) = api.resolve(example) else {
                continue;
            };
            out.push_str(&format!("  - {name}\n\n"));
            out.push_str(&json_block(example));
        }
    }
    out
}

fn reference_appendix(api: &ApiDocument) -> String {
    let mut out = String::from("## References\n\n");
    for (key, value) in api.references() {
        out.push_str(&format!("### {key}\n\n"));
        out.push_str(&schema_section(api, value));
    }
    out
}

/// Render a body, parameter, response or schema as fenced blocks.
///
/// Objects carrying `content` list each media type with its schema.
/// Parameters with a `schema` render as a named declaration; parameters
/// without one, and shapes the tree renderer doesn't handle, dump as JSON.
fn schema_section(api: &ApiDocument, node: &Value) -> String {
    let Some(object) = api.resolve(node) else {
        return String::new();
    };

    if let Some(content) = object.get("content").and_then(Value::as_object) {
        let mut out = String::new();
        for (media_type, media) in content {
            out.push_str(&format!("- {media_type}\n\n"));
            if let Some(schema) = media.get("schema") {
                out.push_str(&schema_section(api, schema));
            }
        }
        return out;
    }

    let mut out = String::from("```typescript\n");
    if let Some(schema) = object.get("schema") {
        let name = str_field(object, "name");
        let required = match object.get("required") {
            Some(Value::Array(fields)) => {
                name.is_some_and(|name| fields.iter().any(|f| f.as_str() == Some(name)))
            }
            Some(Value::Bool(required)) => *required,
            _ => false,
        };
        if let Some(target) = ref_name(node) {
            out.push_str(&format!("// {target}\n"));
        }
        out.push_str(&render_schema(api, name, schema, required));
    } else if object.get("in").is_some() || !SchemaNode::classify(object).is_structured() {
        let pretty = serde_json::to_string_pretty(object).unwrap_or_else(|_| object.to_string());
        out.push_str(&pretty);
        out.push('\n');
    } else {
        out.push_str(&render_schema(api, None, node, false));
    }
    out.push_str("```\n\n");
    out
}
