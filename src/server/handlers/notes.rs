use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::core::errors::ApiError;
use crate::notes::{EnrichmentReport, Note, NoteInput, SavedNote};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct NoteResponse {
    pub id: String,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub embedding: Vec<f32>,
    pub chunk_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrichment: Option<EnrichmentReport>,
}

impl From<Note> for NoteResponse {
    fn from(note: Note) -> Self {
        Self {
            chunk_count: note.chunks.len(),
            id: note.id,
            title: note.title,
            content: note.content,
            tags: note.tags,
            embedding: note.embedding,
            enrichment: None,
        }
    }
}

impl From<SavedNote> for NoteResponse {
    fn from(saved: SavedNote) -> Self {
        Self {
            enrichment: Some(saved.enrichment),
            ..Self::from(saved.note)
        }
    }
}

pub async fn list_notes(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let notes: Vec<NoteResponse> = state
        .notes
        .list()
        .await?
        .into_iter()
        .map(NoteResponse::from)
        .collect();
    Ok(Json(notes))
}

pub async fn create_note(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NoteInput>,
) -> Result<impl IntoResponse, ApiError> {
    let saved = state.notes.create(payload).await?;
    Ok((StatusCode::CREATED, Json(NoteResponse::from(saved))))
}

pub async fn get_note(
    State(state): State<Arc<AppState>>,
    Path(note_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let note = state.notes.get(&note_id).await?;
    Ok(Json(NoteResponse::from(note)))
}

pub async fn update_note(
    State(state): State<Arc<AppState>>,
    Path(note_id): Path<String>,
    Json(payload): Json<NoteInput>,
) -> Result<impl IntoResponse, ApiError> {
    let saved = state.notes.update(&note_id, payload).await?;
    Ok(Json(NoteResponse::from(saved)))
}

pub async fn delete_note(
    State(state): State<Arc<AppState>>,
    Path(note_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.notes.delete(&note_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
