use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::core::errors::ApiError;
use crate::rag::{MAX_TOP_K, MIN_TOP_K};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AskRequest {
    pub question: String,
    pub top_k: Option<usize>,
}

impl AskRequest {
    fn resolve_top_k(&self, default_top_k: usize) -> Result<usize, ApiError> {
        let top_k = self.top_k.unwrap_or(default_top_k);
        if !(MIN_TOP_K..=MAX_TOP_K).contains(&top_k) {
            return Err(ApiError::BadRequest(format!(
                "top_k must be between {} and {}",
                MIN_TOP_K, MAX_TOP_K
            )));
        }
        Ok(top_k)
    }
}

pub async fn ask(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let question = payload.question.trim();
    if question.is_empty() {
        return Err(ApiError::BadRequest("question must not be empty".to_string()));
    }
    let top_k = payload.resolve_top_k(state.settings.rag.default_top_k)?;

    let notes = state.notes.snapshot().await?;
    let response = state.ask.ask(question, top_k, &notes).await?;
    Ok(Json(response))
}
