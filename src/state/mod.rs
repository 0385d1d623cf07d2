use std::sync::Arc;

use crate::core::config::{AppConfig, AppPaths, ConfigService, StorageBackend};
use crate::llm::{EmbeddingProvider, GenerationProvider, OpenAiProvider};
use crate::notes::{InMemoryNoteStore, NoteService, NoteStore, SqliteNoteStore, Tagger};
use crate::rag::{AskPipeline, ChunkConfig};

pub mod error;

use error::InitializationError;

/// Application state shared across all routes.
///
/// Holds the resolved configuration, the note write path and the ask
/// pipeline. Providers are injected so tests can swap in doubles.
#[derive(Clone)]
pub struct AppState {
    pub settings: AppConfig,
    pub notes: NoteService,
    pub ask: AskPipeline,
}

impl AppState {
    /// Loads configuration, opens the configured note store and connects
    /// the OpenAI-compatible provider for both embeddings and generation.
    pub async fn initialize(paths: Arc<AppPaths>) -> Result<Arc<Self>, InitializationError> {
        let config = ConfigService::new(paths.clone());
        let settings = config
            .load_settings()
            .map_err(|e| InitializationError::Config(e.into()))?;

        if let Ok(raw) = config.load_config() {
            tracing::debug!(
                "Effective config: {}",
                config.redact_sensitive_values(&raw)
            );
        }

        let store: Arc<dyn NoteStore> = match settings.storage.backend {
            StorageBackend::Memory => Arc::new(InMemoryNoteStore::new()),
            StorageBackend::Sqlite => Arc::new(
                SqliteNoteStore::new(paths.as_ref())
                    .await
                    .map_err(|e| InitializationError::Store(e.into()))?,
            ),
        };
        tracing::info!("Note store backend: {:?}", settings.storage.backend);

        let provider = Arc::new(
            OpenAiProvider::new(&settings.llm).map_err(|e| InitializationError::Llm(e.into()))?,
        );
        if settings.llm.api_key.is_none() {
            tracing::warn!("No LLM API key configured; enrichment and answers will fail");
        }

        Ok(Arc::new(Self::with_providers(
            settings,
            store,
            provider.clone(),
            provider,
        )))
    }

    pub fn with_providers(
        settings: AppConfig,
        store: Arc<dyn NoteStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn GenerationProvider>,
    ) -> Self {
        let chunking = ChunkConfig {
            max_words: settings.rag.chunk_max_words,
            overlap: settings.rag.chunk_overlap,
        };
        let notes = NoteService::new(
            store,
            Tagger::new(generator.clone()),
            embedder.clone(),
            chunking,
        );
        let ask = AskPipeline::new(embedder, generator);

        Self {
            settings,
            notes,
            ask,
        }
    }
}
