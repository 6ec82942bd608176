//! Error types for structured output extraction and validation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Validation error with location information.
///
/// One schema violation: what failed and where in the data structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Error message describing what went wrong
    pub message: String,
    /// JSON pointer to the offending value (e.g., "/user/name", "/items/0/price")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// JSON pointer to the schema keyword that failed (e.g., "/properties/due/format")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_path: Option<String>,
}

impl ValidationError {
    pub fn new(
        message: impl Into<String>,
        path: Option<String>,
        schema_path: Option<String>,
    ) -> Self {
        Self {
            message: message.into(),
            path,
            schema_path,
        }
    }

    /// Create an error with a path.
    pub fn with_path(message: impl Into<String>, path: String) -> Self {
        Self::new(message, Some(path), None)
    }

    /// Create an error without path.
    pub fn without_path(message: impl Into<String>) -> Self {
        Self::new(message, None, None)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.path.as_deref() {
            Some(path) if !path.is_empty() => write!(f, "{}: {}", path, self.message),
            _ => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Result of validation operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    /// Whether validation passed
    pub valid: bool,
    /// List of validation errors (empty if valid)
    pub errors: Vec<ValidationError>,
    /// Validated/prepared data (None if invalid)
    pub data: Option<serde_json::Value>,
}

impl ValidationResult {
    /// Create a successful validation result.
    pub fn success(data: serde_json::Value) -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            data: Some(data),
        }
    }

    /// Create a failed validation result.
    pub fn failure(errors: Vec<ValidationError>) -> Self {
        Self {
            valid: false,
            errors,
            data: None,
        }
    }

    /// Check if validation passed.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Get the validated data.
    pub fn data(&self) -> Option<&serde_json::Value> {
        self.data.as_ref()
    }

    /// Get errors as formatted strings.
    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.to_string()).collect()
    }

    /// Convert to Result, carrying every violation on failure.
    pub fn into_result(self) -> Result<serde_json::Value, StructuredError> {
        if self.valid {
            Ok(self.data.unwrap_or(serde_json::Value::Null))
        } else {
            Err(StructuredError::Validation {
                violations: self.errors,
            })
        }
    }
}

impl From<Vec<ValidationError>> for ValidationResult {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self::failure(errors)
    }
}

/// Failure to turn model output into a schema-checked value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum StructuredError {
    /// No JSON value could be recovered from the text.
    #[serde(rename = "json_error")]
    #[error("json_error: {message}")]
    Json { message: String },

    /// A value was recovered but does not satisfy the schema.
    #[serde(rename = "validation_error")]
    #[error("validation_error: {}", join_violations(.violations))]
    Validation { violations: Vec<ValidationError> },
}

impl StructuredError {
    pub fn json(message: impl Into<String>) -> Self {
        StructuredError::Json {
            message: message.into(),
        }
    }

    /// Taxonomy name: `json_error` or `validation_error`.
    pub fn name(&self) -> &'static str {
        match self {
            StructuredError::Json { .. } => "json_error",
            StructuredError::Validation { .. } => "validation_error",
        }
    }

    pub fn violations(&self) -> &[ValidationError] {
        match self {
            StructuredError::Json { .. } => &[],
            StructuredError::Validation { violations } => violations,
        }
    }

    /// Human-readable message; one violation per line.
    pub fn message(&self) -> String {
        match self {
            StructuredError::Json { message } => message.clone(),
            StructuredError::Validation { violations } => join_violations(violations),
        }
    }
}

fn join_violations(violations: &[ValidationError]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
