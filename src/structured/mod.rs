//! Structured output: JSON extraction, repair and schema validation.
//!
//! - [`extract`]: find the JSON value in free-form model output
//! - [`repair`]: lenient rewrite of almost-JSON
//! - [`SchemaValidator`]: coercing schema validation with the empty-optional-date exemption
//! - [`JsonModeConfig`]: what a call asked for
//!
//! # Examples
//!
//! ```
//! use ai_lib_unify::structured::extract_and_validate;
//! use serde_json::json;
//!
//! let schema = json!({
//!     "type": "object",
//!     "properties": {
//!         "name": {"type": "string"},
//!         "due": {"type": "string", "format": "date-time"}
//!     },
//!     "required": ["name"]
//! });
//!
//! let text = "Sure! ```json\n{name: 'Alice', due: null,}\n``` Anything else?";
//! let value = extract_and_validate(text, Some(&schema)).unwrap();
//! assert_eq!(value["name"], "Alice");
//! ```

pub mod error;
pub mod extract;
pub mod json_mode;
pub mod repair;
pub mod schema;
pub mod validator;

pub use error::{StructuredError, ValidationError, ValidationResult};
pub use extract::{extract, extract_strict, first_balanced_span, strip_fence};
pub use json_mode::{JsonMode, JsonModeConfig};
pub use repair::repair;
pub use schema::{json_schema_from_type, SchemaGenerator};
pub use validator::{validate, validate_as, SchemaValidator};

/// Extract JSON from `text` and, when `schema` is given, validate it.
pub fn extract_and_validate(text: &str, schema: Option<&serde_json::Value>) -> crate::Result<serde_json::Value> {
    let value = extract(text)?;
    match schema {
        Some(schema) => validate(value, schema),
        None => Ok(value),
    }
}
