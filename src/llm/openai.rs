use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use super::provider::{EmbeddingProvider, GenerationProvider, ProviderError};
use super::types::{ChatMessage, OutputSchema};
use crate::core::config::LlmConfig;

/// Client for an OpenAI-compatible API serving both embeddings and
/// schema-constrained chat completions.
#[derive(Clone)]
pub struct OpenAiProvider {
    base_url: String,
    api_key: Option<String>,
    chat_model: String,
    embedding_model: String,
    client: Client,
}

impl OpenAiProvider {
    pub fn new(config: &LlmConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            chat_model: config.chat_model.clone(),
            embedding_model: config.embedding_model.clone(),
            client,
        })
    }

    fn api_key(&self) -> Result<&str, ProviderError> {
        self.api_key.as_deref().ok_or(ProviderError::MissingApiKey)
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<reqwest::Response, ProviderError> {
        let url = format!("{}{}", self.base_url, path);
        let res = self
            .client
            .post(&url)
            .bearer_auth(self.api_key()?)
            .json(body)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(ProviderError::Status { status, body });
        }

        Ok(res)
    }
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
    refusal: Option<String>,
}

fn parse_embeddings(payload: EmbeddingsResponse, expected: usize) -> Result<Vec<Vec<f32>>, ProviderError> {
    let mut items = payload.data;
    if items.len() != expected {
        return Err(ProviderError::MalformedResponse(format!(
            "expected {} embeddings, got {}",
            expected,
            items.len()
        )));
    }
    items.sort_by_key(|item| item.index);
    Ok(items.into_iter().map(|item| item.embedding).collect())
}

fn parse_structured_content(payload: ChatCompletionResponse) -> Result<Value, ProviderError> {
    let message = payload
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message)
        .ok_or_else(|| ProviderError::MalformedResponse("no choices returned".to_string()))?;

    if let Some(refusal) = message.refusal {
        return Err(ProviderError::MalformedResponse(format!(
            "model refused: {}",
            refusal
        )));
    }

    let content = message
        .content
        .ok_or_else(|| ProviderError::MalformedResponse("empty message content".to_string()))?;

    serde_json::from_str(&content)
        .map_err(|e| ProviderError::MalformedResponse(format!("content is not JSON: {}", e)))
}

#[async_trait]
impl EmbeddingProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let body = json!({
            "model": self.embedding_model,
            "input": inputs,
            "encoding_format": "float",
        });

        let res = self.post_json("/v1/embeddings", &body).await?;
        let payload: EmbeddingsResponse = res
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        parse_embeddings(payload, inputs.len())
    }
}

#[async_trait]
impl GenerationProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate_structured(
        &self,
        prompt: &str,
        schema: &OutputSchema,
    ) -> Result<Value, ProviderError> {
        let body = json!({
            "model": self.chat_model,
            "messages": [ChatMessage::user(prompt)],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": schema.name,
                    "schema": schema.schema,
                    "strict": true,
                }
            },
        });

        let res = self.post_json("/v1/chat/completions", &body).await?;
        let payload: ChatCompletionResponse = res
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        parse_structured_content(payload)
    }
}
