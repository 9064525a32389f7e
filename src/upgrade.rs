//! Swagger 2.0 to OpenAPI 3.0 upgrade.
//!
//! Covers what the Markdown output reads: servers, body and form parameters
//! as request bodies, response content, component sections, security
//! schemes, and `$ref` targets.

use std::collections::BTreeSet;

use serde_json::{json, Map, Value};
use tracing::debug;

use crate::error::UpgradeError;

const TARGET_VERSION: &str = "3.0.0";

const DEFAULT_MEDIA_TYPE: &str = "application/json";
const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
const MULTIPART: &str = "multipart/form-data";

const HTTP_METHODS: &[&str] = &[
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// Keys of a non-body v2 parameter that belong to its v3 `schema`.
const SCHEMA_KEYS: &[&str] = &[
    "type",
    "format",
    "items",
    "enum",
    "default",
    "minimum",
    "maximum",
    "exclusiveMinimum",
    "exclusiveMaximum",
    "minLength",
    "maxLength",
    "pattern",
    "minItems",
    "maxItems",
    "uniqueItems",
    "multipleOf",
];

/// True when the document has no `openapi` version key.
pub fn needs_upgrade(document: &Value) -> bool {
    document.get("openapi").is_none()
}

/// Upgrade a Swagger 2.0 document to OpenAPI 3.0.0.
///
/// # Errors
///
/// Returns `UpgradeError::UnsupportedVersion` if `swagger` is missing or isn't 2.x.
pub fn upgrade(document: &Value) -> Result<Value, UpgradeError> {
    let version = match document.get("swagger") {
        Some(Value::String(version)) => version.clone(),
        Some(other) => other.to_string(),
        None => {
            return Err(UpgradeError::UnsupportedVersion {
                found: "no openapi or swagger field".to_string(),
            })
        }
    };
    if !version.starts_with('2') {
        return Err(UpgradeError::UnsupportedVersion {
            found: format!("swagger {version}"),
        });
    }
    debug!(version, "upgrading swagger document");

    let mut source = document.clone();
    let body_parameters = body_parameter_names(&source);
    rewrite_refs(&mut source, &body_parameters);

    Ok(Upgrader::new(&source).run())
}

enum ParameterKind<'s> {
    Body(&'s Value),
    Form(&'s Value),
    Plain,
}

struct Upgrader<'s> {
    source: &'s Value,
    consumes: Vec<String>,
    produces: Vec<String>,
}

impl<'s> Upgrader<'s> {
    fn new(source: &'s Value) -> Self {
        let default = || vec![DEFAULT_MEDIA_TYPE.to_string()];
        Self {
            source,
            consumes: media_types(source.get("consumes")).unwrap_or_else(default),
            produces: media_types(source.get("produces")).unwrap_or_else(default),
        }
    }

    fn run(&self) -> Value {
        let mut out = Map::new();
        out.insert("openapi".into(), json!(TARGET_VERSION));
        if let Some(info) = self.source.get("info") {
            out.insert("info".into(), info.clone());
        }
        let servers = self.servers();
        if !servers.is_empty() {
            out.insert("servers".into(), Value::Array(servers));
        }
        for key in ["tags", "externalDocs", "security"] {
            if let Some(value) = self.source.get(key) {
                out.insert(key.into(), value.clone());
            }
        }
        out.insert("paths".into(), self.paths());
        let components = self.components();
        if !components.is_empty() {
            out.insert("components".into(), Value::Object(components));
        }
        Value::Object(out)
    }

    fn servers(&self) -> Vec<Value> {
        let base_path = self
            .source
            .get("basePath")
            .and_then(Value::as_str)
            .unwrap_or("");

        match self.source.get("host").and_then(Value::as_str) {
            Some(host) => {
                let schemes = media_types(self.source.get("schemes"))
                    .unwrap_or_else(|| vec!["https".to_string()]);
                schemes
                    .iter()
                    .map(|scheme| json!({ "url": format!("{scheme}://{host}{base_path}") }))
                    .collect()
            }
            None if !base_path.is_empty() => vec![json!({ "url": base_path })],
            None => Vec::new(),
        }
    }

    fn paths(&self) -> Value {
        let Some(paths) = self.source.get("paths").and_then(Value::as_object) else {
            return json!({});
        };

        let mut out = Map::new();
        for (path, item) in paths {
            let Some(item) = item.as_object() else {
                out.insert(path.clone(), item.clone());
                continue;
            };
            let mut converted = Map::new();
            for (key, value) in item {
                let value = if key == "parameters" {
                    Value::Array(self.plain_parameters(value))
                } else if HTTP_METHODS.contains(&key.as_str()) {
                    self.operation(value)
                } else {
                    value.clone()
                };
                converted.insert(key.clone(), value);
            }
            out.insert(path.clone(), Value::Object(converted));
        }
        Value::Object(out)
    }

    fn operation(&self, operation: &'s Value) -> Value {
        let Some(fields) = operation.as_object() else {
            return operation.clone();
        };
        let consumes = media_types(operation.get("consumes")).unwrap_or_else(|| self.consumes.clone());
        let produces = media_types(operation.get("produces")).unwrap_or_else(|| self.produces.clone());

        let mut out = Map::new();
        let mut body = None;
        let mut form = Vec::new();
        for (key, value) in fields {
            match key.as_str() {
                "consumes" | "produces" | "schemes" => {}
                "parameters" => {
                    let mut parameters = Vec::new();
                    for parameter in value.as_array().into_iter().flatten() {
                        match self.parameter_kind(parameter) {
                            ParameterKind::Body(resolved) => {
                                body = Some(if parameter.get("$ref").is_some() {
                                    parameter.clone()
                                } else {
                                    request_body(resolved, &consumes)
                                });
                            }
                            ParameterKind::Form(resolved) => form.push(resolved),
                            ParameterKind::Plain => parameters.push(convert_parameter(parameter)),
                        }
                    }
                    if !parameters.is_empty() {
                        out.insert(key.clone(), Value::Array(parameters));
                    }
                }
                "responses" => {
                    out.insert(key.clone(), self.responses(value, &produces));
                }
                _ => {
                    out.insert(key.clone(), value.clone());
                }
            }
        }

        if body.is_none() && !form.is_empty() {
            body = Some(form_body(&form, &consumes));
        }
        if let Some(body) = body {
            out.insert("requestBody".into(), body);
        }
        Value::Object(out)
    }

    fn plain_parameters(&self, parameters: &'s Value) -> Vec<Value> {
        parameters
            .as_array()
            .into_iter()
            .flatten()
            .filter(|&p| matches!(self.parameter_kind(p), ParameterKind::Plain))
            .map(convert_parameter)
            .collect()
    }

    fn parameter_kind(&self, parameter: &'s Value) -> ParameterKind<'s> {
        let resolved = match parameter.get("$ref").and_then(Value::as_str) {
            Some(target) => match self.shared_parameter(target) {
                Some(shared) => shared,
                None => return ParameterKind::Plain,
            },
            None => parameter,
        };
        match resolved.get("in").and_then(Value::as_str) {
            Some("body") => ParameterKind::Body(resolved),
            Some("formData") => ParameterKind::Form(resolved),
            _ => ParameterKind::Plain,
        }
    }

    /// Look up a rewritten parameter reference in the source `parameters`.
    fn shared_parameter(&self, target: &str) -> Option<&'s Value> {
        let name = target
            .strip_prefix("#/components/parameters/")
            .or_else(|| target.strip_prefix("#/components/requestBodies/"))?;
        self.source.get("parameters")?.get(name)
    }

    fn responses(&self, responses: &Value, produces: &[String]) -> Value {
        let Some(responses) = responses.as_object() else {
            return responses.clone();
        };
        let converted = responses
            .iter()
            .map(|(code, response)| (code.clone(), convert_response(response, produces)))
            .collect();
        Value::Object(converted)
    }

    fn components(&self) -> Map<String, Value> {
        let mut components = Map::new();

        if let Some(definitions) = self.source.get("definitions").and_then(Value::as_object) {
            let schemas = definitions
                .iter()
                .map(|(name, schema)| (name.clone(), convert_schema(schema)))
                .collect();
            components.insert("schemas".into(), Value::Object(schemas));
        }

        if let Some(parameters) = self.source.get("parameters").and_then(Value::as_object) {
            let mut plain = Map::new();
            let mut bodies = Map::new();
            for (name, parameter) in parameters {
                match parameter.get("in").and_then(Value::as_str) {
                    Some("body") => {
                        bodies.insert(name.clone(), request_body(parameter, &self.consumes));
                    }
                    // Inlined into each operation's form body.
                    Some("formData") => {}
                    _ => {
                        plain.insert(name.clone(), convert_parameter(parameter));
                    }
                }
            }
            if !plain.is_empty() {
                components.insert("parameters".into(), Value::Object(plain));
            }
            if !bodies.is_empty() {
                components.insert("requestBodies".into(), Value::Object(bodies));
            }
        }

        if let Some(responses) = self.source.get("responses").and_then(Value::as_object) {
            let converted = responses
                .iter()
                .map(|(name, response)| (name.clone(), convert_response(response, &self.produces)))
                .collect();
            components.insert("responses".into(), Value::Object(converted));
        }

        if let Some(schemes) = self
            .source
            .get("securityDefinitions")
            .and_then(Value::as_object)
        {
            let converted = schemes
                .iter()
                .map(|(name, scheme)| (name.clone(), convert_security_scheme(scheme)))
                .collect();
            components.insert("securitySchemes".into(), Value::Object(converted));
        }

        components
    }
}

fn media_types(value: Option<&Value>) -> Option<Vec<String>> {
    let types: Vec<String> = value?
        .as_array()?
        .iter()
        .filter_map(Value::as_str)
        .map(String::from)
        .collect();
    (!types.is_empty()).then_some(types)
}

fn body_parameter_names(source: &Value) -> BTreeSet<String> {
    source
        .get("parameters")
        .and_then(Value::as_object)
        .map(|parameters| {
            parameters
                .iter()
                .filter(|(_, p)| p.get("in").and_then(Value::as_str) == Some("body"))
                .map(|(name, _)| name.clone())
                .collect()
        })
        .unwrap_or_default()
}

fn rewrite_refs(value: &mut Value, body_parameters: &BTreeSet<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                match child {
                    Value::String(target) if key == "$ref" => {
                        *target = rewrite_ref(target, body_parameters);
                    }
                    _ => rewrite_refs(child, body_parameters),
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                rewrite_refs(item, body_parameters);
            }
        }
        _ => {}
    }
}

fn rewrite_ref(target: &str, body_parameters: &BTreeSet<String>) -> String {
    if let Some(rest) = target.strip_prefix("#/definitions/") {
        format!("#/components/schemas/{rest}")
    } else if let Some(rest) = target.strip_prefix("#/parameters/") {
        if body_parameters.contains(rest) {
            format!("#/components/requestBodies/{rest}")
        } else {
            format!("#/components/parameters/{rest}")
        }
    } else if let Some(rest) = target.strip_prefix("#/responses/") {
        format!("#/components/responses/{rest}")
    } else {
        target.to_string()
    }
}

fn request_body(parameter: &Value, consumes: &[String]) -> Value {
    let schema = parameter
        .get("schema")
        .map(convert_schema)
        .unwrap_or_else(|| json!({}));

    let mut body = Map::new();
    if let Some(description) = parameter.get("description") {
        body.insert("description".into(), description.clone());
    }
    body.insert("content".into(), media_content(consumes, &schema));
    if let Some(required) = parameter.get("required") {
        body.insert("required".into(), required.clone());
    }
    Value::Object(body)
}

fn form_body(parameters: &[&Value], consumes: &[String]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    let mut has_file = false;

    for parameter in parameters {
        let Some(name) = parameter.get("name").and_then(Value::as_str) else {
            continue;
        };
        has_file |= parameter.get("type").and_then(Value::as_str) == Some("file");
        let mut schema = parameter_schema(parameter);
        if let Some(description) = parameter.get("description") {
            schema.insert("description".into(), description.clone());
        }
        properties.insert(name.to_string(), Value::Object(schema));
        if parameter.get("required").and_then(Value::as_bool) == Some(true) {
            required.push(json!(name));
        }
    }

    let mut schema = Map::new();
    schema.insert("type".into(), json!("object"));
    schema.insert("properties".into(), Value::Object(properties));
    if !required.is_empty() {
        schema.insert("required".into(), Value::Array(required));
    }

    let mut form_types: Vec<String> = consumes
        .iter()
        .filter(|m| m.as_str() == FORM_URLENCODED || m.as_str() == MULTIPART)
        .cloned()
        .collect();
    if form_types.is_empty() {
        let form_type = if has_file { MULTIPART } else { FORM_URLENCODED };
        form_types.push(form_type.to_string());
    }

    json!({ "content": media_content(&form_types, &Value::Object(schema)) })
}

fn media_content(media_types: &[String], schema: &Value) -> Value {
    let content = media_types
        .iter()
        .map(|media_type| (media_type.clone(), json!({ "schema": schema })))
        .collect();
    Value::Object(content)
}

/// Collect the schema keys of a non-body parameter or header.
fn parameter_schema(parameter: &Value) -> Map<String, Value> {
    let mut schema = Map::new();
    for key in SCHEMA_KEYS {
        if let Some(value) = parameter.get(*key) {
            schema.insert(key.to_string(), convert_schema(value));
        }
    }
    if schema.get("type").and_then(Value::as_str) == Some("file") {
        schema.insert("type".into(), json!("string"));
        schema.insert("format".into(), json!("binary"));
    }
    schema
}

fn convert_parameter(parameter: &Value) -> Value {
    let Some(fields) = parameter.as_object() else {
        return parameter.clone();
    };
    if fields.contains_key("$ref") {
        return parameter.clone();
    }

    let mut out = Map::new();
    for (key, value) in fields {
        if SCHEMA_KEYS.contains(&key.as_str()) || key == "collectionFormat" {
            continue;
        }
        out.insert(key.clone(), value.clone());
    }

    let location = parameter.get("in").and_then(Value::as_str);
    match parameter.get("collectionFormat").and_then(Value::as_str) {
        Some("ssv") => {
            out.insert("style".into(), json!("spaceDelimited"));
        }
        Some("pipes") => {
            out.insert("style".into(), json!("pipeDelimited"));
        }
        Some("csv") if location == Some("query") => {
            out.insert("explode".into(), json!(false));
        }
        Some("multi") => {
            out.insert("explode".into(), json!(true));
        }
        _ => {}
    }

    let schema = parameter_schema(parameter);
    if !schema.is_empty() {
        out.insert("schema".into(), Value::Object(schema));
    }
    Value::Object(out)
}

fn convert_response(response: &Value, produces: &[String]) -> Value {
    let Some(fields) = response.as_object() else {
        return response.clone();
    };
    if fields.contains_key("$ref") {
        return response.clone();
    }

    let mut out = Map::new();
    out.insert(
        "description".into(),
        fields.get("description").cloned().unwrap_or_else(|| json!("")),
    );
    for (key, value) in fields {
        match key.as_str() {
            "description" | "schema" | "examples" => {}
            "headers" => {
                out.insert(key.clone(), convert_headers(value));
            }
            _ => {
                out.insert(key.clone(), value.clone());
            }
        }
    }

    let examples = fields.get("examples").and_then(Value::as_object);
    if let Some(schema) = fields.get("schema") {
        let schema = convert_schema(schema);
        let mut media_list: Vec<&str> = produces.iter().map(String::as_str).collect();
        for media_type in examples.into_iter().flat_map(|e| e.keys()) {
            if !media_list.contains(&media_type.as_str()) {
                media_list.push(media_type);
            }
        }

        let mut content = Map::new();
        for media_type in media_list {
            let mut media = Map::new();
            media.insert("schema".into(), schema.clone());
            if let Some(example) = examples.and_then(|e| e.get(media_type)) {
                media.insert("example".into(), example.clone());
            }
            content.insert(media_type.to_string(), Value::Object(media));
        }
        out.insert("content".into(), Value::Object(content));
    }
    Value::Object(out)
}

fn convert_headers(headers: &Value) -> Value {
    let Some(headers) = headers.as_object() else {
        return headers.clone();
    };
    let converted = headers
        .iter()
        .map(|(name, header)| {
            let mut out = Map::new();
            if let Some(description) = header.get("description") {
                out.insert("description".into(), description.clone());
            }
            out.insert("schema".into(), Value::Object(parameter_schema(header)));
            (name.clone(), Value::Object(out))
        })
        .collect();
    Value::Object(converted)
}

fn convert_schema(schema: &Value) -> Value {
    let Some(fields) = schema.as_object() else {
        return schema.clone();
    };

    let mut out = Map::new();
    for (key, value) in fields {
        match key.as_str() {
            "type" if value == "file" => {
                out.insert("type".into(), json!("string"));
                out.entry("format").or_insert_with(|| json!("binary"));
            }
            "x-nullable" => {
                out.insert("nullable".into(), value.clone());
            }
            "discriminator" if value.is_string() => {
                out.insert(key.clone(), json!({ "propertyName": value }));
            }
            "properties" => {
                let properties = value
                    .as_object()
                    .map(|props| {
                        props
                            .iter()
                            .map(|(name, prop)| (name.clone(), convert_schema(prop)))
                            .collect()
                    })
                    .map(Value::Object)
                    .unwrap_or_else(|| value.clone());
                out.insert(key.clone(), properties);
            }
            "items" | "additionalProperties" | "not" => {
                out.insert(key.clone(), convert_schema(value));
            }
            "allOf" | "anyOf" | "oneOf" => {
                let branches = value
                    .as_array()
                    .map(|branches| Value::Array(branches.iter().map(convert_schema).collect()))
                    .unwrap_or_else(|| value.clone());
                out.insert(key.clone(), branches);
            }
            _ => {
                out.insert(key.clone(), value.clone());
            }
        }
    }
    Value::Object(out)
}

fn convert_security_scheme(scheme: &Value) -> Value {
    let description = scheme.get("description");
    let with_description = |mut out: Map<String, Value>| {
        if let Some(description) = description {
            out.insert("description".into(), description.clone());
        }
        Value::Object(out)
    };

    match scheme.get("type").and_then(Value::as_str) {
        Some("basic") => {
            let mut out = Map::new();
            out.insert("type".into(), json!("http"));
            out.insert("scheme".into(), json!("basic"));
            with_description(out)
        }
        Some("oauth2") => {
            let flow_name = match scheme.get("flow").and_then(Value::as_str) {
                Some("implicit") => "implicit",
                Some("password") => "password",
                Some("application") => "clientCredentials",
                Some("accessCode") => "authorizationCode",
                _ => return scheme.clone(),
            };
            let mut flow = Map::new();
            for key in ["authorizationUrl", "tokenUrl"] {
                if let Some(url) = scheme.get(key) {
                    flow.insert(key.into(), url.clone());
                }
            }
            flow.insert(
                "scopes".into(),
                scheme.get("scopes").cloned().unwrap_or_else(|| json!({})),
            );

            let mut out = Map::new();
            out.insert("type".into(), json!("oauth2"));
            out.insert("flows".into(), json!({ flow_name: flow }));
            with_description(out)
        }
        _ => scheme.clone(),
    }
}
