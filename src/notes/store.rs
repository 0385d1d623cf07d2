//! NoteStore trait and the in-memory backend.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use super::model::Note;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("corrupt stored note: {0}")]
    Corrupt(String),
}

/// Persistent home of notes and their chunk records.
///
/// `list` returns notes in insertion order; retrieval tie-breaking relies on
/// that order being stable between calls.
#[async_trait]
pub trait NoteStore: Send + Sync {
    async fn insert(&self, note: Note) -> Result<(), StoreError>;

    /// Replace a note wholesale, chunks included. Returns false if the id is
    /// unknown.
    async fn replace(&self, note: Note) -> Result<bool, StoreError>;

    async fn get(&self, id: &str) -> Result<Option<Note>, StoreError>;

    async fn list(&self) -> Result<Vec<Note>, StoreError>;

    async fn delete(&self, id: &str) -> Result<bool, StoreError>;
}

#[derive(Default)]
pub struct InMemoryNoteStore {
    notes: RwLock<Vec<Note>>,
}

impl InMemoryNoteStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NoteStore for InMemoryNoteStore {
    async fn insert(&self, note: Note) -> Result<(), StoreError> {
        self.notes.write().await.push(note);
        Ok(())
    }

    async fn replace(&self, note: Note) -> Result<bool, StoreError> {
        let mut notes = self.notes.write().await;
        match notes.iter_mut().find(|existing| existing.id == note.id) {
            Some(slot) => {
                *slot = note;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get(&self, id: &str) -> Result<Option<Note>, StoreError> {
        let notes = self.notes.read().await;
        Ok(notes.iter().find(|note| note.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<Note>, StoreError> {
        Ok(self.notes.read().await.clone())
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut notes = self.notes.write().await;
        let before = notes.len();
        notes.retain(|note| note.id != id);
        Ok(notes.len() != before)
    }
}
