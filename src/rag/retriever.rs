//! Top-k chunk retrieval over a read snapshot of notes.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::similarity::{try_similarity, INCOMPARABLE};
use crate::notes::Note;

/// Smallest and largest `top_k` an ask request may use.
pub const MIN_TOP_K: usize = 1;
pub const MAX_TOP_K: usize = 10;

/// A chunk scored against one query. Lives for a single retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub note_id: String,
    pub chunk_index: usize,
    pub text: String,
    pub score: f32,
}

/// Number of chunks across all notes.
pub fn pool_size(notes: &[Note]) -> usize {
    notes.iter().map(|note| note.chunks.len()).sum()
}

/// Rank every chunk of every note against `query_embedding` and keep the
/// best `top_k`.
///
/// The pool is flattened in note order, then chunk order. Incomparable
/// chunks rank below every real score, a genuine -1.0 included, and are
/// reported with [`INCOMPARABLE`]. Ties keep pool order, so equal inputs
/// always give equal output.
pub fn retrieve(query_embedding: &[f32], notes: &[Note], top_k: usize) -> Vec<ScoredChunk> {
    let mut scored: Vec<(Option<f32>, ScoredChunk)> = notes
        .iter()
        .flat_map(|note| {
            note.chunks.iter().map(move |chunk| {
                let score = try_similarity(query_embedding, &chunk.embedding);
                let candidate = ScoredChunk {
                    note_id: note.id.clone(),
                    chunk_index: chunk.index,
                    text: chunk.text.clone(),
                    score: score.unwrap_or(INCOMPARABLE),
                };
                (score, candidate)
            })
        })
        .collect();

    // sort_by is stable
    scored.sort_by(|(a, _), (b, _)| rank_desc(*a, *b));
    scored.truncate(top_k);
    scored.into_iter().map(|(_, chunk)| chunk).collect()
}

fn rank_desc(a: Option<f32>, b: Option<f32>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
