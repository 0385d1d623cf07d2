use serde::{Deserialize, Serialize};

/// One retrievable window of a note, embedded on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// 0-based, contiguous within the note
    pub index: usize,
    pub text: String,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    /// Whole-note embedding; empty when enrichment failed. Retrieval scores
    /// chunk embeddings only.
    pub embedding: Vec<f32>,
    pub chunks: Vec<Chunk>,
}

/// Title and body submitted on create or update.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NoteInput {
    pub title: String,
    pub content: String,
}
