//! JSON mode: what structured output a call asked for, and how to recover it from text.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::structured::extract::extract_with;
use crate::structured::validator::SchemaValidator;
use crate::types::ResultUnit;
use crate::Result;

/// JSON mode options for structured output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JsonMode {
    /// Any JSON object or array.
    #[serde(rename = "json_object")]
    Json,

    /// JSON checked against a schema.
    #[serde(rename = "json_schema")]
    JsonSchema,

    /// Plain output; nothing is extracted.
    #[default]
    #[serde(rename = "off")]
    Off,
}

impl JsonMode {
    /// Wire name used in `response_format` payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            JsonMode::Json => "json_object",
            JsonMode::JsonSchema => "json_schema",
            JsonMode::Off => "",
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, JsonMode::Off)
    }
}

impl std::fmt::Display for JsonMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JsonMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "json_object" | "json" => Ok(JsonMode::Json),
            "json_schema" => Ok(JsonMode::JsonSchema),
            "off" | "" => Ok(JsonMode::Off),
            _ => Err(format!("Unknown JSON mode: {}", s)),
        }
    }
}

/// Structured output requested by one call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonModeConfig {
    pub mode: JsonMode,

    /// Schema to validate against; only meaningful for [`JsonMode::JsonSchema`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,

    /// Schema name for providers that want one.
    #[serde(default = "default_schema_name")]
    pub schema_name: String,
}

fn default_schema_name() -> String {
    "response".to_string()
}

impl Default for JsonModeConfig {
    fn default() -> Self {
        Self::off()
    }
}

impl JsonModeConfig {
    /// No structured output.
    pub fn off() -> Self {
        Self {
            mode: JsonMode::Off,
            schema: None,
            schema_name: default_schema_name(),
        }
    }

    /// Any JSON value, no schema.
    ///
    /// ```
    /// use ai_lib_unify::structured::{JsonMode, JsonModeConfig};
    ///
    /// let config = JsonModeConfig::json_object();
    /// assert_eq!(config.mode, JsonMode::Json);
    /// assert_eq!(config.response_format()["type"], "json_object");
    /// ```
    pub fn json_object() -> Self {
        Self {
            mode: JsonMode::Json,
            ..Self::off()
        }
    }

    /// JSON validated against `schema`.
    pub fn from_schema(schema: Value, name: impl Into<String>) -> Self {
        Self {
            mode: JsonMode::JsonSchema,
            schema: Some(schema),
            schema_name: name.into(),
        }
    }

    /// Schema generated from a Rust type.
    pub fn for_type<T: schemars::JsonSchema>() -> Self {
        Self::from_schema(
            crate::structured::schema::json_schema_from_type::<T>(),
            T::schema_name(),
        )
    }

    pub fn is_enabled(&self) -> bool {
        self.mode.is_enabled()
    }

    /// The schema to enforce, if the mode enforces one.
    pub fn active_schema(&self) -> Option<&Value> {
        match self.mode {
            JsonMode::JsonSchema => self.schema.as_ref(),
            _ => None,
        }
    }

    /// `response_format` object for drivers whose vendor accepts one.
    pub fn response_format(&self) -> Value {
        match (self.mode, self.schema.as_ref()) {
            (JsonMode::Off, _) => json!({}),
            (JsonMode::JsonSchema, Some(schema)) => json!({
                "type": JsonMode::JsonSchema.as_str(),
                "json_schema": {
                    "name": self.schema_name,
                    "schema": schema
                }
            }),
            _ => json!({ "type": JsonMode::Json.as_str() }),
        }
    }

    /// Extract the structured value from `text` and validate it when a schema is set.
    ///
    /// Extraction and validation failures surface as [`crate::Error::Structured`]; a schema
    /// that does not compile is a configuration error.
    pub fn resolve(&self, text: &str, allow_repair: bool) -> Result<Value> {
        let value = extract_with(text, allow_repair)?;
        self.check(value)
    }

    /// Like [`resolve`](Self::resolve), over accumulated result units. When the units carry no
    /// text, a structured unit the provider already emitted is validated as is.
    pub fn resolve_units(&self, units: &[ResultUnit], allow_repair: bool) -> Result<Value> {
        let text: String = units.iter().filter_map(ResultUnit::as_text).collect();
        if text.trim().is_empty() {
            if let Some(value) = units.iter().find_map(ResultUnit::as_structured) {
                return self.check(value.clone());
            }
        }
        self.resolve(&text, allow_repair)
    }

    fn check(&self, value: Value) -> Result<Value> {
        match self.active_schema() {
            Some(schema) => Ok(SchemaValidator::new(schema.clone())?.validate(value)?),
            None => Ok(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_mode_display() {
        assert_eq!(JsonMode::Json.to_string(), "json_object");
        assert_eq!(JsonMode::JsonSchema.to_string(), "json_schema");
        assert_eq!(JsonMode::Off.to_string(), "");
    }

    #[test]
    fn test_json_mode_from_str() {
        assert_eq!("json_object".parse::<JsonMode>().unwrap(), JsonMode::Json);
        assert_eq!("json_schema".parse::<JsonMode>().unwrap(), JsonMode::JsonSchema);
        assert_eq!("".parse::<JsonMode>().unwrap(), JsonMode::Off);
        assert!("yaml".parse::<JsonMode>().is_err());
    }

    #[test]
    fn test_schema_ignored_outside_schema_mode() {
        let mut config = JsonModeConfig::json_object();
        config.schema = Some(json!({"type": "object"}));
        assert!(config.active_schema().is_none());
        assert_eq!(config.response_format(), json!({"type": "json_object"}));
    }

    #[test]
    fn test_resolve_with_schema() {
        let config = JsonModeConfig::from_schema(
            json!({
                "type": "object",
                "properties": {"score": {"type": "number"}},
                "required": ["score"]
            }),
            "rating",
        );
        let value = config
            .resolve("Here you go:\n```json\n{\"score\": \"4.5\"}\n```", true)
            .unwrap();
        assert_eq!(value, json!({"score": 4.5}));

        let err = config.resolve(r#"{"rating": 4}"#, true).unwrap_err();
        assert_eq!(err.name(), "validation_error");
    }

    #[test]
    fn test_resolve_without_repair() {
        let config = JsonModeConfig::json_object();
        assert!(config.resolve("{a: 1}", false).is_err());
        assert_eq!(config.resolve("{a: 1}", true).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn test_resolve_units_prefers_emitted_structure() {
        let config = JsonModeConfig::json_object();
        let units = vec![ResultUnit::structured(json!({"a": 1}))];
        assert_eq!(config.resolve_units(&units, true).unwrap(), json!({"a": 1}));

        let units = vec![ResultUnit::text("{\"b\": "), ResultUnit::text("2}")];
        assert_eq!(config.resolve_units(&units, true).unwrap(), json!({"b": 2}));
    }

    #[test]
    fn test_config_deserializes_with_default_name() {
        let config: JsonModeConfig = serde_json::from_value(json!({"mode": "json_object"})).unwrap();
        assert_eq!(config.schema_name, "response");
        assert_eq!(config.mode, JsonMode::Json);
    }
}
