use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// A named JSON-schema contract for structured generation.
///
/// The schema is written out explicitly rather than derived from a Rust type
/// so the provider-facing shape stays stable when internal types change.
#[derive(Debug, Clone)]
pub struct OutputSchema {
    pub name: String,
    pub schema: Value,
}

impl OutputSchema {
    pub fn new(name: impl Into<String>, schema: Value) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }

    /// Check `instance` against the schema, returning every violation.
    pub fn validate(&self, instance: &Value) -> Result<(), Vec<String>> {
        let validator =
            jsonschema::validator_for(&self.schema).map_err(|e| vec![format!("invalid schema: {}", e)])?;

        let errors: Vec<String> = validator.iter_errors(instance).map(|e| e.to_string()).collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
