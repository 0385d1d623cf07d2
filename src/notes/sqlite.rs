//! SQLite-backed note store.
//!
//! Notes and their chunks live in two tables; embeddings are stored as
//! little-endian f32 blobs. Updating a note rewrites its chunk rows in the
//! same transaction as the note row.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow, SqliteSynchronous};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};

use super::model::{Chunk, Note};
use super::store::{NoteStore, StoreError};
use crate::core::config::AppPaths;

pub struct SqliteNoteStore {
    pool: SqlitePool,
}

impl SqliteNoteStore {
    pub async fn new(paths: &AppPaths) -> Result<Self, StoreError> {
        Self::with_path(paths.db_path.clone()).await
    }

    pub async fn with_path(db_path: PathBuf) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS notes (
                position INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                title TEXT NOT NULL,
                content TEXT NOT NULL DEFAULT '',
                tags TEXT NOT NULL DEFAULT '[]',
                embedding BLOB,
                created_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now')),
                updated_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS note_chunks (
                note_id TEXT NOT NULL REFERENCES notes(id) ON DELETE CASCADE,
                chunk_index INTEGER NOT NULL,
                text TEXT NOT NULL,
                embedding BLOB,
                PRIMARY KEY (note_id, chunk_index)
            )",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn deserialize_embedding(bytes: &[u8]) -> Result<Vec<f32>, StoreError> {
        if bytes.len() % 4 != 0 {
            return Err(StoreError::Corrupt(format!(
                "embedding blob of {} bytes",
                bytes.len()
            )));
        }
        Ok(bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect())
    }

    fn row_to_note(row: &SqliteRow, chunks: Vec<Chunk>) -> Result<Note, StoreError> {
        let tags_json: String = row.try_get("tags")?;
        let tags: Vec<String> = serde_json::from_str(&tags_json)
            .map_err(|e| StoreError::Corrupt(format!("tags: {}", e)))?;
        let embedding: Option<Vec<u8>> = row.try_get("embedding")?;

        Ok(Note {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            content: row.try_get("content")?,
            tags,
            embedding: Self::deserialize_embedding(&embedding.unwrap_or_default())?,
            chunks,
        })
    }

    fn row_to_chunk(row: &SqliteRow) -> Result<(String, Chunk), StoreError> {
        let index: i64 = row.try_get("chunk_index")?;
        let embedding: Option<Vec<u8>> = row.try_get("embedding")?;
        let chunk = Chunk {
            index: usize::try_from(index)
                .map_err(|_| StoreError::Corrupt(format!("chunk index {}", index)))?,
            text: row.try_get("text")?,
            embedding: Self::deserialize_embedding(&embedding.unwrap_or_default())?,
        };
        Ok((row.try_get("note_id")?, chunk))
    }

    async fn insert_chunks(
        tx: &mut Transaction<'_, Sqlite>,
        note: &Note,
    ) -> Result<(), StoreError> {
        for chunk in &note.chunks {
            sqlx::query(
                "INSERT INTO note_chunks (note_id, chunk_index, text, embedding)
                 VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(&note.id)
            .bind(chunk.index as i64)
            .bind(&chunk.text)
            .bind(Self::serialize_embedding(&chunk.embedding))
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    fn tags_json(note: &Note) -> Result<String, StoreError> {
        serde_json::to_string(&note.tags).map_err(|e| StoreError::Corrupt(e.to_string()))
    }
}

#[async_trait]
impl NoteStore for SqliteNoteStore {
    async fn insert(&self, note: Note) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO notes (id, title, content, tags, embedding)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&note.id)
        .bind(&note.title)
        .bind(&note.content)
        .bind(Self::tags_json(&note)?)
        .bind(Self::serialize_embedding(&note.embedding))
        .execute(&mut *tx)
        .await?;

        Self::insert_chunks(&mut tx, &note).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn replace(&self, note: Note) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE notes
             SET title = ?2, content = ?3, tags = ?4, embedding = ?5,
                 updated_at = STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now')
             WHERE id = ?1",
        )
        .bind(&note.id)
        .bind(&note.title)
        .bind(&note.content)
        .bind(Self::tags_json(&note)?)
        .bind(Self::serialize_embedding(&note.embedding))
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("DELETE FROM note_chunks WHERE note_id = ?1")
            .bind(&note.id)
            .execute(&mut *tx)
            .await?;
        Self::insert_chunks(&mut tx, &note).await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn get(&self, id: &str) -> Result<Option<Note>, StoreError> {
        let Some(row) = sqlx::query(
            "SELECT id, title, content, tags, embedding FROM notes WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let chunk_rows = sqlx::query(
            "SELECT note_id, chunk_index, text, embedding
             FROM note_chunks
             WHERE note_id = ?1
             ORDER BY chunk_index",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let chunks = chunk_rows
            .iter()
            .map(|row| Self::row_to_chunk(row).map(|(_, chunk)| chunk))
            .collect::<Result<Vec<_>, _>>()?;

        Self::row_to_note(&row, chunks).map(Some)
    }

    async fn list(&self) -> Result<Vec<Note>, StoreError> {
        let note_rows = sqlx::query(
            "SELECT id, title, content, tags, embedding FROM notes ORDER BY position",
        )
        .fetch_all(&self.pool)
        .await?;

        let chunk_rows = sqlx::query(
            "SELECT note_id, chunk_index, text, embedding
             FROM note_chunks
             ORDER BY note_id, chunk_index",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut chunks_by_note: HashMap<String, Vec<Chunk>> = HashMap::new();
        for row in &chunk_rows {
            let (note_id, chunk) = Self::row_to_chunk(row)?;
            chunks_by_note.entry(note_id).or_default().push(chunk);
        }

        note_rows
            .iter()
            .map(|row| {
                let id: String = row.try_get("id")?;
                let chunks = chunks_by_note.remove(&id).unwrap_or_default();
                Self::row_to_note(row, chunks)
            })
            .collect()
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM notes WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
