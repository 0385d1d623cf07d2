//! Notes, their chunk records, and the write path that keeps them enriched.

mod enrichment;
mod model;
mod service;
mod sqlite;
mod store;
pub mod tagging;

pub use enrichment::{Enrichment, EnrichmentReport, EnrichmentStatus};
pub use model::{Chunk, Note, NoteInput};
pub use service::{NoteService, SavedNote};
pub use sqlite::SqliteNoteStore;
pub use store::{InMemoryNoteStore, NoteStore, StoreError};
pub use tagging::Tagger;
