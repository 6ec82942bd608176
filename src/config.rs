//! Runtime configuration.
//!
//! Defaults suit most callers; a YAML file and `AI_LIB_*` environment variables can adjust
//! them. Environment values override the file.
//!
//! | Variable | Field | Default |
//! |----------|-------|---------|
//! | `AI_LIB_REPAIR_JSON` | `repair_json` | `true` |
//! | `AI_LIB_ATTACH_VALIDATION_ERRORS` | `attach_validation_errors` | `false` |
//! | `AI_LIB_PARSE_TOOL_ARGUMENTS` | `parse_tool_arguments` | `true` |
//! | `AI_LIB_LOG_CHUNKS` | `log_chunks` | `false` |

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{Error, ErrorContext, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Run the lenient repair pass when strict JSON parsing fails.
    pub repair_json: bool,
    /// Store streaming validation failures on the completion instead of failing the call.
    pub attach_validation_errors: bool,
    /// Parse tool-call argument strings as JSON at the end of a call.
    pub parse_tool_arguments: bool,
    /// Emit one debug event per streamed chunk.
    pub log_chunks: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            repair_json: true,
            attach_validation_errors: false,
            parse_tool_arguments: true,
            log_chunks: false,
        }
    }
}

impl RuntimeConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&text)
    }

    /// Defaults with environment overrides applied.
    pub fn from_env() -> Result<Self> {
        Self::default().apply_env()
    }

    /// Apply `AI_LIB_*` environment overrides.
    pub fn apply_env(self) -> Result<Self> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup.
    pub fn apply_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let fields: [(&str, &mut bool); 4] = [
            ("AI_LIB_REPAIR_JSON", &mut self.repair_json),
            ("AI_LIB_ATTACH_VALIDATION_ERRORS", &mut self.attach_validation_errors),
            ("AI_LIB_PARSE_TOOL_ARGUMENTS", &mut self.parse_tool_arguments),
            ("AI_LIB_LOG_CHUNKS", &mut self.log_chunks),
        ];
        for (key, slot) in fields {
            if let Some(raw) = lookup(key) {
                *slot = parse_flag(key, &raw)?;
            }
        }
        Ok(self)
    }
}

fn parse_flag(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::configuration_with_context(
            "invalid boolean",
            ErrorContext::new()
                .with_field_path(key)
                .with_details(format!("got {:?}", raw))
                .with_source("runtime_config"),
        )),
    }
}
