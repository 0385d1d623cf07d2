//! Best-effort enrichment results for the note write path.
//!
//! Tags and embeddings are nice to have when a note is saved: if a provider
//! call fails the note is still stored, with an empty placeholder, and the
//! failure is kept here so it can be logged and reported.

use std::fmt::Display;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq)]
pub enum Enrichment<T> {
    Enriched(T),
    Failed { reason: String },
}

impl<T> Enrichment<T> {
    pub fn from_result<E: Display>(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Enrichment::Enriched(value),
            Err(err) => Enrichment::Failed {
                reason: err.to_string(),
            },
        }
    }

    pub fn is_enriched(&self) -> bool {
        matches!(self, Enrichment::Enriched(_))
    }

    pub fn status(&self) -> EnrichmentStatus {
        match self {
            Enrichment::Enriched(_) => EnrichmentStatus::Enriched,
            Enrichment::Failed { reason } => EnrichmentStatus::Failed {
                reason: reason.clone(),
            },
        }
    }
}

impl<T: Default> Enrichment<T> {
    /// The enriched value, or the empty placeholder stored on failure.
    pub fn into_value_or_default(self) -> T {
        match self {
            Enrichment::Enriched(value) => value,
            Enrichment::Failed { .. } => T::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EnrichmentStatus {
    Enriched,
    Failed { reason: String },
}

/// Per-step outcome of one note write.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichmentReport {
    pub tags: EnrichmentStatus,
    pub embedding: EnrichmentStatus,
    pub chunks: EnrichmentStatus,
}

impl EnrichmentReport {
    pub fn is_complete(&self) -> bool {
        [&self.tags, &self.embedding, &self.chunks]
            .iter()
            .all(|status| **status == EnrichmentStatus::Enriched)
    }
}
