//! Output validator for structured responses.
//!
//! Validation runs in three steps:
//! 1. The value is prepared the way a coercing validator would: scalars and array-typed
//!    fields are coerced, `default`s are filled in, and properties rejected by
//!    `additionalProperties: false` are dropped.
//! 2. The prepared value is checked with [`jsonschema`] (draft 7, formats enabled).
//! 3. Violations on empty, optional `date` / `date-time` fields are discarded; models
//!    routinely emit `null` or `""` for dates they do not know.

use jsonschema::{Draft, JSONSchema};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::structured::error::{StructuredError, ValidationError, ValidationResult};
use crate::{Error, ErrorContext, Result};

/// Validator for structured output, compiled once per schema.
pub struct SchemaValidator {
    schema: Value,
    compiled: JSONSchema,
}

impl std::fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

impl SchemaValidator {
    /// Compile `schema`. An invalid schema is a configuration error, not a validation error.
    pub fn new(schema: Value) -> Result<Self> {
        let compiled = JSONSchema::options()
            .with_draft(Draft::Draft7)
            .should_validate_formats(true)
            .compile(&schema)
            .map_err(|e| {
                Error::configuration_with_context(
                    format!("Failed to compile schema: {}", e),
                    ErrorContext::new()
                        .with_field_path(e.schema_path.to_string())
                        .with_source("schema_validator"),
                )
            })?;
        Ok(Self { schema, compiled })
    }

    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// Validate `value`, returning the prepared value on success.
    pub fn validate(&self, value: Value) -> std::result::Result<Value, StructuredError> {
        self.check(value).into_result()
    }

    /// Validate `value` and report every remaining violation.
    pub fn check(&self, value: Value) -> ValidationResult {
        let prepared = prepare(value, &self.schema, &self.schema);

        let raw: Vec<ValidationError> = match self.compiled.validate(&prepared) {
            Ok(()) => Vec::new(),
            Err(errors) => errors
                .map(|e| {
                    ValidationError::new(
                        e.to_string(),
                        Some(e.instance_path.to_string()),
                        Some(e.schema_path.to_string()),
                    )
                })
                .collect(),
        };

        let violations: Vec<ValidationError> = raw
            .into_iter()
            .filter(|v| !is_exempt(v, &prepared, &self.schema))
            .collect();

        if violations.is_empty() {
            ValidationResult::success(prepared)
        } else {
            tracing::debug!(
                violations = violations.len(),
                "structured output failed schema validation"
            );
            ValidationResult::failure(violations)
        }
    }

    /// Validate and deserialize into `T`.
    pub fn validate_into<T: DeserializeOwned>(&self, value: Value) -> Result<T> {
        let value = self.validate(value)?;
        Ok(serde_json::from_value(value)?)
    }
}

/// One-shot validation: compile `schema` and validate `value` against it.
pub fn validate(value: Value, schema: &Value) -> Result<Value> {
    let validator = SchemaValidator::new(schema.clone())?;
    Ok(validator.validate(value)?)
}

/// Validate `value` against the schema generated for `T`, then deserialize.
pub fn validate_as<T>(value: Value) -> Result<T>
where
    T: DeserializeOwned + schemars::JsonSchema,
{
    let schema = crate::structured::schema::json_schema_from_type::<T>();
    SchemaValidator::new(schema)?.validate_into(value)
}

/// An empty value on an optional `date` / `date-time` field is not a real violation.
///
/// The field schema is located by walking the instance path through the root schema, so
/// fields behind `$ref`, `anyOf` / `oneOf` / `allOf` and array items are found the same way
/// [`prepare`] reaches them.
fn is_exempt(violation: &ValidationError, instance: &Value, root: &Value) -> bool {
    let Some(path) = violation.path.as_deref() else {
        return false;
    };
    let is_empty = match instance.pointer(path) {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        _ => false,
    };
    if !is_empty {
        return false;
    }

    let segments: Vec<String> = path
        .split('/')
        .skip(1)
        .map(|s| s.replace("~1", "/").replace("~0", "~"))
        .collect();
    let Some((field, parents)) = segments.split_last() else {
        return false;
    };
    let Some(parent) = parents
        .iter()
        .try_fold(root, |schema, segment| child_schema(schema, root, segment))
    else {
        return false;
    };

    match property_owner(parent, root, field) {
        Some(owner) => {
            let required = owner
                .get("required")
                .and_then(Value::as_array)
                .map_or(false, |r| r.iter().any(|name| name.as_str() == Some(field.as_str())));
            !required && owner["properties"].get(field).map_or(false, |f| is_date(f, root))
        }
        None => child_schema(parent, root, field).map_or(false, |f| is_date(f, root)),
    }
}

/// Sub-schemas of a composed schema (`allOf` / `anyOf` / `oneOf`).
fn branches(schema: &Value) -> impl Iterator<Item = &Value> {
    ["allOf", "anyOf", "oneOf"]
        .into_iter()
        .filter_map(move |k| schema.get(k).and_then(Value::as_array))
        .flatten()
}

/// The (dereferenced) schema that declares property `name`.
fn property_owner<'a>(schema: &'a Value, root: &'a Value, name: &str) -> Option<&'a Value> {
    let schema = deref(schema, root);
    if schema.pointer("/properties").and_then(|p| p.get(name)).is_some() {
        return Some(schema);
    }
    branches(schema).find_map(|b| property_owner(b, root, name))
}

/// The schema governing instance key or index `segment` below `schema`.
fn child_schema<'a>(schema: &'a Value, root: &'a Value, segment: &str) -> Option<&'a Value> {
    let schema = deref(schema, root);
    if let Some(owner) = property_owner(schema, root, segment) {
        return owner["properties"].get(segment);
    }
    let direct = match schema.get("items") {
        Some(Value::Array(tuple)) => segment.parse::<usize>().ok().and_then(|i| tuple.get(i)),
        Some(items @ Value::Object(_)) => Some(items),
        _ => match schema.get("additionalProperties") {
            Some(extra @ Value::Object(_)) => Some(extra),
            _ => None,
        },
    };
    direct.or_else(|| branches(schema).find_map(|b| child_schema(b, root, segment)))
}

fn is_date(schema: &Value, root: &Value) -> bool {
    let schema = deref(schema, root);
    matches!(
        schema.get("format").and_then(Value::as_str),
        Some("date") | Some("date-time")
    ) || branches(schema).any(|b| is_date(b, root))
}

/// Follow a local `$ref` (`#/definitions/...`).
fn deref<'a>(schema: &'a Value, root: &'a Value) -> &'a Value {
    match schema.get("$ref").and_then(Value::as_str) {
        Some(r) if r.starts_with('#') => root.pointer(&r[1..]).unwrap_or(schema),
        _ => schema,
    }
}

/// Coerce, default and strip `value` according to `schema`.
pub(crate) fn prepare(value: Value, schema: &Value, root: &Value) -> Value {
    let schema = deref(schema, root);
    let value = coerce_type(value, schema);

    match value {
        Value::Object(map) => Value::Object(prepare_object(map, schema, root)),
        Value::Array(items) => Value::Array(prepare_array(items, schema, root)),
        other => other,
    }
}

fn prepare_object(mut map: Map<String, Value>, schema: &Value, root: &Value) -> Map<String, Value> {
    let properties = schema.get("properties").and_then(Value::as_object);

    if let Some(properties) = properties {
        for (name, sub) in properties {
            let sub = deref(sub, root);
            match map.remove(name) {
                Some(v) => {
                    map.insert(name.clone(), prepare(v, sub, root));
                }
                None => {
                    if let Some(default) = sub.get("default") {
                        map.insert(name.clone(), default.clone());
                    }
                }
            }
        }
    }

    let patterns: Vec<Regex> = schema
        .get("patternProperties")
        .and_then(Value::as_object)
        .map(|p| p.keys().filter_map(|k| Regex::new(k).ok()).collect())
        .unwrap_or_default();
    let is_declared = |key: &str| {
        properties.map_or(false, |p| p.contains_key(key))
            || patterns.iter().any(|re| re.is_match(key))
    };

    match schema.get("additionalProperties") {
        Some(Value::Bool(false)) => {
            map.retain(|key, _| is_declared(key));
        }
        Some(extra @ Value::Object(_)) => {
            let keys: Vec<String> = map.keys().filter(|k| !is_declared(k)).cloned().collect();
            for key in keys {
                if let Some(v) = map.remove(&key) {
                    map.insert(key, prepare(v, extra, root));
                }
            }
        }
        _ => {}
    }

    map
}

fn prepare_array(items: Vec<Value>, schema: &Value, root: &Value) -> Vec<Value> {
    match schema.get("items") {
        Some(Value::Array(tuple)) => items
            .into_iter()
            .enumerate()
            .map(|(i, v)| match tuple.get(i) {
                Some(sub) => prepare(v, sub, root),
                None => v,
            })
            .collect(),
        Some(item_schema @ Value::Object(_)) => items
            .into_iter()
            .map(|v| prepare(v, item_schema, root))
            .collect(),
        _ => items,
    }
}

fn declared_types(schema: &Value) -> Vec<&str> {
    match schema.get("type") {
        Some(Value::String(t)) => vec![t.as_str()],
        Some(Value::Array(ts)) => ts.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

fn coerce_type(value: Value, schema: &Value) -> Value {
    let types = declared_types(schema);
    if types.is_empty() || types.iter().any(|t| matches_type(&value, t)) {
        return value;
    }
    for t in &types {
        if let Some(coerced) = coerce_to(&value, t) {
            return coerced;
        }
    }
    value
}

fn matches_type(value: &Value, t: &str) -> bool {
    match t {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => {
            value.is_i64() || value.is_u64() || value.as_f64().map_or(false, |f| f.fract() == 0.0)
        }
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn coerce_to(value: &Value, t: &str) -> Option<Value> {
    if t == "array" {
        return Some(Value::Array(vec![value.clone()]));
    }
    if let Value::Array(items) = value {
        return match items.as_slice() {
            [single] if matches_type(single, t) => Some(single.clone()),
            [single] => coerce_scalar(single, t),
            _ => None,
        };
    }
    coerce_scalar(value, t)
}

fn coerce_scalar(value: &Value, t: &str) -> Option<Value> {
    match (t, value) {
        ("string", Value::Number(n)) => Some(Value::String(n.to_string())),
        ("string", Value::Bool(b)) => Some(Value::String(b.to_string())),
        ("string", Value::Null) => Some(Value::String(String::new())),

        ("number", Value::String(s)) => parse_number(s),
        ("integer", Value::String(s)) => s.trim().parse::<i64>().ok().map(Value::from),
        ("number" | "integer", Value::Bool(b)) => Some(Value::from(u8::from(*b))),
        ("number" | "integer", Value::Null) => Some(Value::from(0)),

        ("boolean", Value::String(s)) => match s.trim() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        ("boolean", Value::Number(n)) => match n.as_f64() {
            Some(f) if f == 1.0 => Some(Value::Bool(true)),
            Some(f) if f == 0.0 => Some(Value::Bool(false)),
            _ => None,
        },
        ("boolean", Value::Null) => Some(Value::Bool(false)),

        ("null", Value::String(s)) if s.is_empty() => Some(Value::Null),
        ("null", Value::Bool(false)) => Some(Value::Null),
        ("null", Value::Number(n)) if n.as_f64() == Some(0.0) => Some(Value::Null),

        _ => None,
    }
}

fn parse_number(s: &str) -> Option<Value> {
    let s = s.trim();
    if let Ok(i) = s.parse::<i64>() {
        return Some(Value::from(i));
    }
    s.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
}
