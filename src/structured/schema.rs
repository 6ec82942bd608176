//! Schema construction for structured output requests.
//!
//! Schemas either come from a Rust type via `schemars` ([`json_schema_from_type`]) or are
//! assembled field by field with [`SchemaGenerator`].

use serde_json::{json, Map, Value};

/// Builder for object schemas.
///
/// ```
/// use ai_lib_unify::structured::SchemaGenerator;
/// use serde_json::json;
///
/// let schema = SchemaGenerator::new()
///     .title("Meeting")
///     .required_property("title", json!({"type": "string"}))
///     .date_property("starts_at", true)
///     .build();
/// assert_eq!(schema["required"], json!(["title"]));
/// ```
#[derive(Debug, Clone, Default)]
pub struct SchemaGenerator {
    title: Option<String>,
    description: Option<String>,
    properties: Map<String, Value>,
    required: Vec<String>,
    closed: bool,
}

impl SchemaGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add an optional property.
    pub fn property(mut self, name: impl Into<String>, schema: Value) -> Self {
        self.properties.insert(name.into(), schema);
        self
    }

    /// Add a property and list it in `required`.
    pub fn required_property(mut self, name: impl Into<String>, schema: Value) -> Self {
        let name = name.into();
        if !self.required.contains(&name) {
            self.required.push(name.clone());
        }
        self.properties.insert(name, schema);
        self
    }

    /// Add an optional `date-time` (or `date` when `with_time` is false) string property.
    ///
    /// Optional date fields left empty by the model are not reported as violations.
    pub fn date_property(self, name: impl Into<String>, with_time: bool) -> Self {
        let format = if with_time { "date-time" } else { "date" };
        self.property(name, json!({"type": "string", "format": format}))
    }

    /// Reject properties that are not declared. Undeclared keys are stripped before validation.
    pub fn closed(mut self, closed: bool) -> Self {
        self.closed = closed;
        self
    }

    pub fn build(self) -> Value {
        let mut map = Map::new();
        if let Some(title) = self.title {
            map.insert("title".into(), title.into());
        }
        if let Some(description) = self.description {
            map.insert("description".into(), description.into());
        }
        map.insert("type".into(), json!("object"));
        map.insert("properties".into(), Value::Object(self.properties));
        if !self.required.is_empty() {
            map.insert("required".into(), self.required.into());
        }
        if self.closed {
            map.insert("additionalProperties".into(), json!(false));
        }
        Value::Object(map)
    }
}

/// JSON schema generated from a Rust type.
pub fn json_schema_from_type<T: schemars::JsonSchema>() -> Value {
    let schema = schemars::schema_for!(T);
    serde_json::to_value(&schema).unwrap_or_else(|_| json!({}))
}
