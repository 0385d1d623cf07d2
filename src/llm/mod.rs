pub mod openai;
pub mod provider;
pub mod structured;
pub mod types;

pub use openai::OpenAiProvider;
pub use provider::{EmbeddingProvider, GenerationProvider, ProviderError};
pub use structured::{generate_validated, StructuredError};
pub use types::{ChatMessage, OutputSchema};
