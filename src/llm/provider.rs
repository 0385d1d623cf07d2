use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use super::types::OutputSchema;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Request(String),
    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),
    #[error("no API key configured for the provider")]
    MissingApiKey,
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Request(err.to_string())
    }
}

/// Turns text into fixed-length vectors. All vectors handed out by one
/// provider share a dimensionality.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    fn name(&self) -> &str;

    /// embed several texts in one round trip; output order matches input order
    async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ProviderError>;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        match vectors.len() {
            1 => Ok(vectors.remove(0)),
            n => Err(ProviderError::MalformedResponse(format!(
                "expected 1 embedding, got {}",
                n
            ))),
        }
    }
}

#[async_trait]
pub trait GenerationProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Run `prompt` constrained to `schema` and return the raw JSON value.
    /// Callers validate the value against the schema themselves.
    async fn generate_structured(
        &self,
        prompt: &str,
        schema: &OutputSchema,
    ) -> Result<Value, ProviderError>;
}
