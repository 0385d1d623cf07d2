use thiserror::Error;

use crate::llm::{ProviderError, StructuredError};

/// Request-level failure of the retrieval and answer pipeline.
///
/// Incomparable vectors and empty chunk pools are not errors; they are
/// handled by scoring and by the fallback answer respectively.
#[derive(Debug, Error)]
pub enum RagError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("structured output failed validation: {0}")]
    SchemaValidation(String),
    #[error("structured output could not be decoded: {0}")]
    Decode(#[source] serde_json::Error),
}

impl From<StructuredError> for RagError {
    fn from(err: StructuredError) -> Self {
        match err {
            StructuredError::Provider(err) => RagError::Provider(err),
            StructuredError::SchemaValidation(msg) => RagError::SchemaValidation(msg),
            StructuredError::Decode(err) => RagError::Decode(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_failures_keep_their_kind() {
        let err: RagError = StructuredError::SchemaValidation("answer: missing".to_string()).into();
        assert!(matches!(err, RagError::SchemaValidation(ref msg) if msg == "answer: missing"));

        let err: RagError = StructuredError::Provider(ProviderError::MissingApiKey).into();
        assert!(matches!(err, RagError::Provider(ProviderError::MissingApiKey)));
    }
}
