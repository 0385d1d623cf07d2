use serde_json::{Map, Value};

use crate::core::errors::ApiError;
use crate::rag::chunker::{DEFAULT_MAX_WORDS, DEFAULT_OVERLAP};

pub fn validate_config(config: &Value) -> Result<(), ApiError> {
    let root = config
        .as_object()
        .ok_or_else(|| config_type_error("root", "object"))?;

    if let Some(server) = expect_optional_object(root, "server")? {
        validate_optional_string_field(server, "server.host", "host")?;
        validate_u64_field(server, "server.port", "port", 0, 65535)?;
        validate_string_array_field(
            server,
            "server.cors_allowed_origins",
            "cors_allowed_origins",
        )?;
    }

    if let Some(llm) = expect_optional_object(root, "llm")? {
        validate_optional_string_field(llm, "llm.base_url", "base_url")?;
        validate_optional_string_field(llm, "llm.api_key", "api_key")?;
        validate_non_empty_string_field(llm, "llm.chat_model", "chat_model")?;
        validate_non_empty_string_field(llm, "llm.embedding_model", "embedding_model")?;
        validate_u64_field(llm, "llm.timeout_secs", "timeout_secs", 1, 3_600)?;
    }

    if let Some(rag) = expect_optional_object(root, "rag")? {
        validate_u64_field(rag, "rag.chunk_max_words", "chunk_max_words", 1, 100_000)?;
        validate_u64_field(rag, "rag.chunk_overlap", "chunk_overlap", 0, 100_000)?;
        validate_u64_field(rag, "rag.default_top_k", "default_top_k", 1, 10)?;
        validate_chunk_window(rag)?;
    }

    if let Some(storage) = expect_optional_object(root, "storage")? {
        if let Some(value) = storage.get("backend") {
            match value.as_str() {
                Some("memory") | Some("sqlite") => {}
                Some(other) => {
                    return Err(ApiError::BadRequest(format!(
                        "Invalid config at 'storage.backend': unknown backend '{}'",
                        other
                    )))
                }
                None => return Err(config_type_error("storage.backend", "string")),
            }
        }
    }

    Ok(())
}

fn expect_optional_object<'a>(
    root: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, ApiError> {
    match root.get(key) {
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(Value::Null) | None => Ok(None),
        Some(_) => Err(config_type_error(key, "object")),
    }
}

fn validate_u64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: u64,
    max: u64,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_u64() else {
        return Err(config_type_error(path, "integer"));
    };
    if number < min || number > max {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

/// Overlap must leave each window at least one new word. Missing keys take
/// their defaults.
fn validate_chunk_window(rag: &Map<String, Value>) -> Result<(), ApiError> {
    let max_words = rag
        .get("chunk_max_words")
        .and_then(Value::as_u64)
        .unwrap_or(DEFAULT_MAX_WORDS as u64);
    let overlap = rag
        .get("chunk_overlap")
        .and_then(Value::as_u64)
        .unwrap_or(DEFAULT_OVERLAP as u64);

    if overlap >= max_words {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at 'rag.chunk_overlap': must be less than chunk_max_words ({})",
            max_words
        )));
    }
    Ok(())
}

fn validate_non_empty_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(text) = value.as_str() else {
        return Err(config_type_error(path, "string"));
    };
    if text.trim().is_empty() {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at '{}': value cannot be empty",
            path
        )));
    }
    Ok(())
}

fn validate_optional_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.is_null() || value.as_str().is_some() {
        return Ok(());
    }
    Err(config_type_error(path, "string"))
}

fn validate_string_array_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(items) = value.as_array() else {
        return Err(config_type_error(path, "array of strings"));
    };
    for (index, item) in items.iter().enumerate() {
        let Some(text) = item.as_str() else {
            return Err(config_type_error(&format!("{}[{}]", path, index), "string"));
        };
        if text.trim().is_empty() {
            return Err(ApiError::BadRequest(format!(
                "Invalid config at '{}[{}]': value cannot be empty",
                path, index
            )));
        }
    }
    Ok(())
}

fn config_type_error(path: &str, expected: &str) -> ApiError {
    ApiError::BadRequest(format!(
        "Invalid config at '{}': expected {}",
        path, expected
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_empty_and_full_configs() {
        validate_config(&json!({})).unwrap();
        validate_config(&json!({
            "server": { "host": "0.0.0.0", "port": 8000, "cors_allowed_origins": ["http://localhost:5173"] },
            "llm": { "chat_model": "gpt-4o-mini", "timeout_secs": 30, "api_key": null },
            "rag": { "chunk_max_words": 200, "chunk_overlap": 40, "default_top_k": 5 },
            "storage": { "backend": "sqlite" }
        }))
        .unwrap();
    }

    #[test]
    fn rejects_out_of_range_top_k() {
        let err = validate_config(&json!({ "rag": { "default_top_k": 11 } })).unwrap_err();
        assert!(err.to_string().contains("rag.default_top_k"));
    }

    #[test]
    fn rejects_overlap_that_fills_the_window() {
        let err = validate_config(&json!({
            "rag": { "chunk_max_words": 50, "chunk_overlap": 50 }
        }))
        .unwrap_err();
        assert!(err.to_string().contains("rag.chunk_overlap"));

        // a smaller window alone still has to clear the default overlap of 40
        assert!(validate_config(&json!({ "rag": { "chunk_max_words": 30 } })).is_err());
        assert!(validate_config(&json!({ "rag": { "chunk_max_words": 30, "chunk_overlap": 29 } })).is_ok());
        assert!(validate_config(&json!({ "rag": { "chunk_overlap": 199 } })).is_ok());
    }

    #[test]
    fn rejects_unknown_storage_backend() {
        let err = validate_config(&json!({ "storage": { "backend": "postgres" } })).unwrap_err();
        assert!(err.to_string().contains("postgres"));
    }

    #[test]
    fn rejects_wrong_types() {
        assert!(validate_config(&json!({ "server": "nope" })).is_err());
        assert!(validate_config(&json!({ "server": { "cors_allowed_origins": [""] } })).is_err());
        assert!(validate_config(&json!({ "llm": { "chat_model": " " } })).is_err());
        assert!(validate_config(&json!([1, 2])).is_err());
    }
}
