use std::sync::Arc;

use super::error::RagError;
use super::retriever::{pool_size, retrieve, MAX_TOP_K, MIN_TOP_K};
use super::synthesizer::{AnswerSynthesizer, AskResponse};
use crate::llm::{EmbeddingProvider, GenerationProvider};
use crate::notes::Note;

/// Query-time pipeline: embed the question, rank chunks, synthesize.
///
/// Holds no retrieval state; each call works on the snapshot it is given.
#[derive(Clone)]
pub struct AskPipeline {
    embedder: Arc<dyn EmbeddingProvider>,
    synthesizer: AnswerSynthesizer,
}

impl AskPipeline {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn GenerationProvider>,
    ) -> Self {
        Self {
            embedder,
            synthesizer: AnswerSynthesizer::new(generator),
        }
    }

    pub async fn ask(
        &self,
        question: &str,
        top_k: usize,
        notes: &[Note],
    ) -> Result<AskResponse, RagError> {
        if pool_size(notes) == 0 {
            tracing::info!("No chunks to search; returning fallback answer");
            return Ok(AskResponse::not_found());
        }

        let top_k = top_k.clamp(MIN_TOP_K, MAX_TOP_K);
        let query_embedding = self.embedder.embed(question).await?;
        let chunks = retrieve(&query_embedding, notes, top_k);

        tracing::debug!(
            "Retrieved {} chunks: {:?}",
            chunks.len(),
            chunks
                .iter()
                .map(|c| format!("{}#{}={:.3}", c.note_id, c.chunk_index, c.score))
                .collect::<Vec<_>>()
        );

        self.synthesizer.synthesize(question, &chunks, notes).await
    }
}
