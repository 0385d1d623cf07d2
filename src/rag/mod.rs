//! Retrieval-augmented answering over the note corpus.
//!
//! - `chunker`: word-window chunking at note write time
//! - `similarity`: cosine scoring with an incomparable sentinel
//! - `retriever`: top-k ranking over every stored chunk
//! - `synthesizer`: grounded prompt, structured answer, citation cleanup
//! - `pipeline`: the query-time composition of the above

pub mod chunker;
mod error;
pub mod pipeline;
pub mod retriever;
pub mod similarity;
pub mod synthesizer;

pub use chunker::{chunk, ChunkConfig};
pub use error::RagError;
pub use pipeline::AskPipeline;
pub use retriever::{retrieve, ScoredChunk, MAX_TOP_K, MIN_TOP_K};
pub use similarity::{similarity, try_similarity, INCOMPARABLE};
pub use synthesizer::{AnswerSynthesizer, AskResponse, Citation, FALLBACK_ANSWER, MAX_QUOTE_CHARS};
