//! Grounded answer synthesis.
//!
//! Builds a prompt from retrieved chunks, asks the generation provider for an
//! answer constrained to the `note_answer` schema, then cleans the result:
//! the answer is trimmed, every quote is capped at [`MAX_QUOTE_CHARS`]
//! characters, and each citation is joined with its note's title.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::error::RagError;
use super::retriever::ScoredChunk;
use crate::llm::{generate_validated, GenerationProvider, OutputSchema};
use crate::notes::Note;

/// Answer returned when the chunks do not contain the answer.
pub const FALLBACK_ANSWER: &str = "Answer could not be found.";

/// Hard cap on citation quote length, in characters.
pub const MAX_QUOTE_CHARS: usize = 160;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub note_id: String,
    pub note_title: String,
    pub quote: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    pub citations: Vec<Citation>,
}

impl AskResponse {
    pub fn not_found() -> Self {
        Self {
            answer: FALLBACK_ANSWER.to_string(),
            citations: Vec::new(),
        }
    }
}

/// Citation as the provider returns it, before the title join.
#[derive(Debug, Clone, Deserialize)]
pub struct DraftCitation {
    pub note_id: String,
    pub chunk_index: i64,
    pub quote: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DraftAnswer {
    pub answer: String,
    pub citations: Vec<DraftCitation>,
}

pub fn answer_schema() -> OutputSchema {
    OutputSchema::new(
        "note_answer",
        json!({
            "type": "object",
            "properties": {
                "answer": { "type": "string" },
                "citations": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "note_id": { "type": "string" },
                            "chunk_index": { "type": "integer" },
                            "quote": { "type": "string" }
                        },
                        "required": ["note_id", "chunk_index", "quote"],
                        "additionalProperties": false
                    }
                }
            },
            "required": ["answer", "citations"],
            "additionalProperties": false
        }),
    )
}

/// Context block: one header per chunk naming its note and index, chunk text
/// below it, blocks separated by a blank line. Input order is kept.
pub fn build_context(chunks: &[ScoredChunk]) -> String {
    chunks
        .iter()
        .map(|c| format!("[note_id={} chunk={}]\n{}", c.note_id, c.chunk_index, c.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn build_prompt(question: &str, chunks: &[ScoredChunk]) -> String {
    format!(
        "Answer the question using only the provided note chunks.\n\
         If the answer is not in the chunks, say: \"{fallback}\"\n\
         Return JSON with an answer and citations pointing to the chunks used.\n\
         \n\
         Question:\n\
         {question}\n\
         \n\
         Chunks:\n\
         {context}",
        fallback = FALLBACK_ANSWER,
        question = question.trim(),
        context = build_context(chunks),
    )
}

pub fn truncate_quote(quote: &str) -> String {
    quote.chars().take(MAX_QUOTE_CHARS).collect()
}

/// Turn a validated provider draft into the final response.
///
/// Citations naming a note that is not in `notes` are dropped, since they
/// cannot carry a title. A fallback answer never carries citations.
pub fn finalize(draft: DraftAnswer, notes: &[Note]) -> AskResponse {
    let answer = draft.answer.trim().to_string();
    if answer == FALLBACK_ANSWER {
        return AskResponse::not_found();
    }

    let titles: HashMap<&str, &str> = notes
        .iter()
        .map(|note| (note.id.as_str(), note.title.as_str()))
        .collect();

    let citations = draft
        .citations
        .into_iter()
        .filter_map(|c| match titles.get(c.note_id.as_str()) {
            Some(title) => Some(Citation {
                note_title: (*title).to_string(),
                quote: truncate_quote(&c.quote),
                note_id: c.note_id,
            }),
            None => {
                tracing::warn!(
                    "Dropping citation for unknown note {} (chunk {})",
                    c.note_id,
                    c.chunk_index
                );
                None
            }
        })
        .collect();

    AskResponse { answer, citations }
}

#[derive(Clone)]
pub struct AnswerSynthesizer {
    generator: Arc<dyn GenerationProvider>,
    schema: OutputSchema,
}

impl AnswerSynthesizer {
    pub fn new(generator: Arc<dyn GenerationProvider>) -> Self {
        Self {
            generator,
            schema: answer_schema(),
        }
    }

    /// One generation call; provider and schema failures are returned as-is.
    pub async fn synthesize(
        &self,
        question: &str,
        chunks: &[ScoredChunk],
        notes: &[Note],
    ) -> Result<AskResponse, RagError> {
        let prompt = build_prompt(question, chunks);
        let draft: DraftAnswer =
            generate_validated(self.generator.as_ref(), &prompt, &self.schema).await?;
        Ok(finalize(draft, notes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ProviderError;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::Mutex;

    struct Recording {
        reply: Value,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl GenerationProvider for Recording {
        fn name(&self) -> &str {
            "recording"
        }

        async fn generate_structured(
            &self,
            prompt: &str,
            schema: &OutputSchema,
        ) -> Result<Value, ProviderError> {
            assert_eq!(schema.name, "note_answer");
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.clone())
        }
    }

    fn scored(note_id: &str, chunk_index: usize, text: &str) -> ScoredChunk {
        ScoredChunk {
            note_id: note_id.to_string(),
            chunk_index,
            text: text.to_string(),
            score: 0.5,
        }
    }

    fn note(id: &str, title: &str) -> Note {
        Note {
            id: id.to_string(),
            title: title.to_string(),
            content: String::new(),
            tags: vec![],
            embedding: vec![],
            chunks: vec![],
        }
    }

    #[test]
    fn context_lists_chunks_in_order_with_headers() {
        let context = build_context(&[scored("n2", 1, "second"), scored("n1", 0, "first")]);
        assert_eq!(
            context,
            "[note_id=n2 chunk=1]\nsecond\n\n[note_id=n1 chunk=0]\nfirst"
        );
    }

    #[test]
    fn prompt_carries_instruction_question_and_context() {
        let prompt = build_prompt("  where did I go?  ", &[scored("n1", 0, "Kyoto in April")]);
        assert!(prompt.starts_with("Answer the question using only the provided note chunks."));
        assert!(prompt.contains("say: \"Answer could not be found.\""));
        assert!(prompt.contains("Question:\nwhere did I go?\n"));
        assert!(prompt.ends_with("Chunks:\n[note_id=n1 chunk=0]\nKyoto in April"));
    }

    #[test]
    fn quotes_are_capped_at_160_characters() {
        let long = "é".repeat(400);
        let quote = truncate_quote(&long);
        assert_eq!(quote.chars().count(), 160);
        assert_eq!(truncate_quote("short"), "short");
    }

    #[test]
    fn finalize_trims_truncates_and_joins_titles() {
        let draft = DraftAnswer {
            answer: "\n  You visited Kyoto.  ".to_string(),
            citations: vec![
                DraftCitation {
                    note_id: "n1".to_string(),
                    chunk_index: 0,
                    quote: "x".repeat(200),
                },
                DraftCitation {
                    note_id: "ghost".to_string(),
                    chunk_index: 3,
                    quote: "made up".to_string(),
                },
            ],
        };

        let response = finalize(draft, &[note("n1", "Trip to Japan")]);
        assert_eq!(response.answer, "You visited Kyoto.");
        assert_eq!(response.citations.len(), 1);
        assert_eq!(response.citations[0].note_title, "Trip to Japan");
        assert_eq!(response.citations[0].quote.len(), 160);
    }

    #[test]
    fn fallback_answer_drops_citations() {
        let draft = DraftAnswer {
            answer: " Answer could not be found. ".to_string(),
            citations: vec![DraftCitation {
                note_id: "n1".to_string(),
                chunk_index: 0,
                quote: "irrelevant".to_string(),
            }],
        };

        assert_eq!(finalize(draft, &[note("n1", "t")]), AskResponse::not_found());
    }

    #[tokio::test]
    async fn synthesize_makes_one_call_with_the_grounded_prompt() {
        let provider = Arc::new(Recording {
            reply: json!({
                "answer": "Kyoto",
                "citations": [{ "note_id": "n1", "chunk_index": 0, "quote": "Kyoto in April" }]
            }),
            prompts: Mutex::new(Vec::new()),
        });
        let synthesizer = AnswerSynthesizer::new(provider.clone());

        let response = synthesizer
            .synthesize(
                "where?",
                &[scored("n1", 0, "Kyoto in April")],
                &[note("n1", "Trip to Japan")],
            )
            .await
            .unwrap();

        assert_eq!(response.answer, "Kyoto");
        assert_eq!(response.citations[0].note_title, "Trip to Japan");
        let prompts = provider.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("[note_id=n1 chunk=0]"));
    }

    #[tokio::test]
    async fn malformed_provider_output_is_a_schema_failure() {
        let provider = Arc::new(Recording {
            reply: json!({ "answer": "Kyoto", "citations": [{ "note_id": "n1" }] }),
            prompts: Mutex::new(Vec::new()),
        });
        let synthesizer = AnswerSynthesizer::new(provider);

        let err = synthesizer
            .synthesize("where?", &[scored("n1", 0, "Kyoto")], &[note("n1", "t")])
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::SchemaValidation(_)));
    }
}
