//! Note write path: validate, enrich, chunk, store.

use std::sync::Arc;

use uuid::Uuid;

use super::enrichment::{Enrichment, EnrichmentReport, EnrichmentStatus};
use super::model::{Chunk, Note, NoteInput};
use super::store::{NoteStore, StoreError};
use super::tagging::Tagger;
use crate::core::errors::ApiError;
use crate::llm::{EmbeddingProvider, ProviderError};
use crate::rag::chunker::{note_text, ChunkConfig};

/// A stored note plus how its enrichment went.
#[derive(Debug, Clone)]
pub struct SavedNote {
    pub note: Note,
    pub enrichment: EnrichmentReport,
}

#[derive(Clone)]
pub struct NoteService {
    store: Arc<dyn NoteStore>,
    tagger: Tagger,
    embedder: Arc<dyn EmbeddingProvider>,
    chunking: ChunkConfig,
}

impl NoteService {
    pub fn new(
        store: Arc<dyn NoteStore>,
        tagger: Tagger,
        embedder: Arc<dyn EmbeddingProvider>,
        chunking: ChunkConfig,
    ) -> Self {
        Self {
            store,
            tagger,
            embedder,
            chunking,
        }
    }

    pub async fn create(&self, input: NoteInput) -> Result<SavedNote, ApiError> {
        validate_input(&input)?;

        let id = Uuid::new_v4().to_string();
        let saved = self.enrich(id, input).await;
        self.store.insert(saved.note.clone()).await?;

        tracing::info!(
            "Created note {} with {} chunks",
            saved.note.id,
            saved.note.chunks.len()
        );
        Ok(saved)
    }

    /// Full replacement: tags, embedding and chunks are recomputed from the
    /// new title and content.
    pub async fn update(&self, id: &str, input: NoteInput) -> Result<SavedNote, ApiError> {
        validate_input(&input)?;

        if self.store.get(id).await?.is_none() {
            return Err(ApiError::NotFound("Note not found".to_string()));
        }

        let saved = self.enrich(id.to_string(), input).await;
        if !self.store.replace(saved.note.clone()).await? {
            return Err(ApiError::NotFound("Note not found".to_string()));
        }

        tracing::info!(
            "Updated note {} with {} chunks",
            saved.note.id,
            saved.note.chunks.len()
        );
        Ok(saved)
    }

    pub async fn get(&self, id: &str) -> Result<Note, ApiError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Note not found".to_string()))
    }

    pub async fn list(&self) -> Result<Vec<Note>, ApiError> {
        Ok(self.store.list().await?)
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        if self.store.delete(id).await? {
            tracing::info!("Deleted note {}", id);
            Ok(())
        } else {
            Err(ApiError::NotFound("Note not found".to_string()))
        }
    }

    /// Read view of every note with its chunks, for retrieval.
    pub async fn snapshot(&self) -> Result<Vec<Note>, StoreError> {
        self.store.list().await
    }

    async fn enrich(&self, id: String, input: NoteInput) -> SavedNote {
        let NoteInput { title, content } = input;
        let text = note_text(&title, &content);

        let tags = Enrichment::from_result(self.tagger.tag(&title, &content).await);
        let embedding = Enrichment::from_result(self.embedder.embed(&text).await);
        let chunks = Enrichment::from_result(self.embed_chunks(&text).await);

        for (step, status) in [
            ("tagging", tags.status()),
            ("embedding", embedding.status()),
            ("chunk embedding", chunks.status()),
        ] {
            if let EnrichmentStatus::Failed { reason } = status {
                tracing::warn!("Note {}: {} failed, storing placeholder: {}", id, step, reason);
            }
        }

        let enrichment = EnrichmentReport {
            tags: tags.status(),
            embedding: embedding.status(),
            chunks: chunks.status(),
        };

        let note = Note {
            id,
            title,
            content,
            tags: tags.into_value_or_default(),
            embedding: embedding.into_value_or_default(),
            chunks: chunks.into_value_or_default(),
        };

        SavedNote { note, enrichment }
    }

    async fn embed_chunks(&self, text: &str) -> Result<Vec<Chunk>, ProviderError> {
        let texts = self.chunking.chunk(text);
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != texts.len() {
            return Err(ProviderError::MalformedResponse(format!(
                "expected {} chunk embeddings, got {}",
                texts.len(),
                embeddings.len()
            )));
        }

        Ok(texts
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(index, (text, embedding))| Chunk {
                index,
                text,
                embedding,
            })
            .collect())
    }
}

fn validate_input(input: &NoteInput) -> Result<(), ApiError> {
    if input.title.trim().is_empty() {
        return Err(ApiError::BadRequest("title must not be empty".to_string()));
    }
    Ok(())
}
