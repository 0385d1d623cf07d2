use serde::de::DeserializeOwned;
use thiserror::Error;

use super::provider::{GenerationProvider, ProviderError};
use super::types::OutputSchema;

#[derive(Debug, Error)]
pub enum StructuredError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("structured output failed validation: {0}")]
    SchemaValidation(String),
    #[error("structured output could not be decoded: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Generate against `schema`, validate the result, then decode it into `T`.
///
/// Provider failures and schema violations are both terminal; nothing is
/// retried here.
pub async fn generate_validated<T: DeserializeOwned>(
    provider: &dyn GenerationProvider,
    prompt: &str,
    schema: &OutputSchema,
) -> Result<T, StructuredError> {
    let value = provider.generate_structured(prompt, schema).await?;

    if let Err(errors) = schema.validate(&value) {
        tracing::warn!(
            "{} output from {} failed validation: {}",
            schema.name,
            provider.name(),
            errors.join("; ")
        );
        return Err(StructuredError::SchemaValidation(errors.join("; ")));
    }

    serde_json::from_value(value).map_err(StructuredError::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde::Deserialize;
    use serde_json::{json, Value};

    struct Canned(Result<Value, ()>);

    #[async_trait]
    impl GenerationProvider for Canned {
        fn name(&self) -> &str {
            "canned"
        }

        async fn generate_structured(
            &self,
            _prompt: &str,
            _schema: &OutputSchema,
        ) -> Result<Value, ProviderError> {
            self.0
                .clone()
                .map_err(|_| ProviderError::Request("connection refused".to_string()))
        }
    }

    #[derive(Debug, Deserialize)]
    struct Reply {
        text: String,
    }

    fn schema() -> OutputSchema {
        OutputSchema::new(
            "reply",
            json!({
                "type": "object",
                "properties": { "text": { "type": "string" } },
                "required": ["text"],
                "additionalProperties": false
            }),
        )
    }

    #[tokio::test]
    async fn decodes_valid_output() {
        let provider = Canned(Ok(json!({ "text": "hi" })));
        let reply: Reply = generate_validated(&provider, "p", &schema()).await.unwrap();
        assert_eq!(reply.text, "hi");
    }

    #[tokio::test]
    async fn invalid_output_is_a_schema_failure() {
        let provider = Canned(Ok(json!({ "text": 3 })));
        let err = generate_validated::<Reply>(&provider, "p", &schema())
            .await
            .unwrap_err();
        assert!(matches!(err, StructuredError::SchemaValidation(_)));
    }

    #[tokio::test]
    async fn schema_valid_but_undecodable_output_is_a_decode_failure() {
        #[derive(Debug, Deserialize)]
        struct Numbered {
            #[allow(dead_code)]
            n: u8,
        }

        let provider = Canned(Ok(json!({ "text": "hi" })));
        let err = generate_validated::<Numbered>(&provider, "p", &schema())
            .await
            .unwrap_err();
        assert!(matches!(err, StructuredError::Decode(_)));
    }

    #[tokio::test]
    async fn provider_failure_propagates() {
        let provider = Canned(Err(()));
        let err = generate_validated::<Reply>(&provider, "p", &schema())
            .await
            .unwrap_err();
        assert!(matches!(err, StructuredError::Provider(ProviderError::Request(_))));
    }
}
