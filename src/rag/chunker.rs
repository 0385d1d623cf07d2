//! Word-window chunking for note text.
//!
//! Text is split on whitespace and cut into windows of `max_words` words.
//! Consecutive windows share `overlap` words. The last window is the first
//! one that reaches the end of the text, so no near-duplicate tail window
//! is produced.

use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_WORDS: usize = 200;
pub const DEFAULT_OVERLAP: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Words per window (values below 1 are treated as 1)
    pub max_words: usize,
    /// Words repeated at the start of the next window
    pub overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_words: DEFAULT_MAX_WORDS,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

impl ChunkConfig {
    pub fn chunk(&self, text: &str) -> Vec<String> {
        chunk(text, self.max_words, self.overlap)
    }
}

/// Split `text` into overlapping word windows joined by single spaces.
///
/// Always terminates: when `overlap >= max_words` the next window start is
/// clamped to advance by at least one word.
pub fn chunk(text: &str, max_words: usize, overlap: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let total = words.len();
    let mut chunks = Vec::new();

    if total == 0 {
        return chunks;
    }

    let max_words = max_words.max(1);
    let mut start = 0;

    loop {
        let end = (start + max_words).min(total);
        let piece = words[start..end].join(" ");
        if !piece.is_empty() {
            chunks.push(piece);
        }

        if end >= total {
            break;
        }

        let next = (start + max_words).saturating_sub(overlap);
        start = next.max(start + 1);
    }

    chunks
}

/// Text a note is chunked and embedded from.
pub fn note_text(title: &str, content: &str) -> String {
    format!("{}\n\n{}", title, content)
}
