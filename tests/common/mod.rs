#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use notetag_backend::core::config::AppConfig;
use notetag_backend::llm::{EmbeddingProvider, GenerationProvider, OutputSchema, ProviderError};
use notetag_backend::notes::InMemoryNoteStore;
use notetag_backend::state::AppState;

const VOCAB: &[&str] = &[
    "japan", "tokyo", "kyoto", "temple", "sushi", "rust", "borrow", "compiler", "lifetime",
];
const BIAS: f32 = 0.1;

/// Bag-of-keywords embedding: one dimension per vocabulary word plus a
/// constant so no text embeds to the zero vector.
pub fn keyword_embedding(text: &str) -> Vec<f32> {
    let lowered = text.to_lowercase();
    let tokens: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();

    let mut vector: Vec<f32> = VOCAB
        .iter()
        .map(|word| tokens.iter().filter(|t| *t == word).count() as f32)
        .collect();
    vector.push(BIAS);
    vector
}

#[derive(Default)]
pub struct KeywordEmbedder {
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl KeywordEmbedder {
    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    fn name(&self) -> &str {
        "keyword"
    }

    async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ProviderError::Status {
                status: 503,
                body: "embedding backend down".to_string(),
            });
        }
        Ok(inputs.iter().map(|text| keyword_embedding(text)).collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerMode {
    /// Answer from the first chunk in the prompt and cite it verbatim.
    CiteFirstChunk,
    Fallback,
    Fail,
    /// Reply that does not match the answer schema.
    Malformed,
}

pub struct ScriptedGenerator {
    pub mode: AnswerMode,
    pub prompts: Mutex<Vec<(String, String)>>,
}

impl ScriptedGenerator {
    pub fn new(mode: AnswerMode) -> Self {
        Self {
            mode,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts sent against the given schema name.
    pub fn prompts_for(&self, schema: &str) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| name == schema)
            .map(|(_, prompt)| prompt.clone())
            .collect()
    }

    fn answer(&self, prompt: &str) -> Result<Value, ProviderError> {
        match self.mode {
            AnswerMode::CiteFirstChunk => {
                let (note_id, chunk_index, text) = first_chunk(prompt)
                    .ok_or_else(|| ProviderError::MalformedResponse("no chunks".to_string()))?;
                Ok(json!({
                    "answer": format!("  Your notes say: {}  ", first_words(&text, 3)),
                    "citations": [
                        { "note_id": note_id, "chunk_index": chunk_index, "quote": text }
                    ]
                }))
            }
            AnswerMode::Fallback => Ok(json!({
                "answer": "Answer could not be found.",
                "citations": [{ "note_id": "n", "chunk_index": 0, "quote": "q" }]
            })),
            AnswerMode::Fail => Err(ProviderError::Status {
                status: 500,
                body: "upstream exploded".to_string(),
            }),
            AnswerMode::Malformed => Ok(json!({ "answer": 42 })),
        }
    }
}

#[async_trait]
impl GenerationProvider for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate_structured(
        &self,
        prompt: &str,
        schema: &OutputSchema,
    ) -> Result<Value, ProviderError> {
        self.prompts
            .lock()
            .unwrap()
            .push((schema.name.clone(), prompt.to_string()));

        match schema.name.as_str() {
            "note_tagging" => Ok(json!({
                "tags": [
                    { "name": "Travel", "confidence": 0.9 },
                    { "name": "Kyoto Temples", "confidence": 0.7 }
                ]
            })),
            "note_answer" => self.answer(prompt),
            other => Err(ProviderError::MalformedResponse(format!(
                "unexpected schema {}",
                other
            ))),
        }
    }
}

/// Parses the first `[note_id=.. chunk=..]` block of an answer prompt.
pub fn first_chunk(prompt: &str) -> Option<(String, i64, String)> {
    let context = prompt.split("Chunks:\n").nth(1)?;
    let mut lines = context.lines();
    let header = lines.next()?;
    let inner = header.strip_prefix("[note_id=")?.strip_suffix(']')?;
    let (note_id, chunk_index) = inner.split_once(" chunk=")?;
    Some((
        note_id.to_string(),
        chunk_index.parse().ok()?,
        lines.next()?.to_string(),
    ))
}

/// Number of chunk headers in an answer prompt.
pub fn chunk_headers(prompt: &str) -> usize {
    prompt.matches("[note_id=").count()
}

fn first_words(text: &str, n: usize) -> String {
    text.split_whitespace().take(n).collect::<Vec<_>>().join(" ")
}

/// 500 words: tokyo and sushi first, kyoto and temple from word 300 on.
pub fn japan_trip_content() -> String {
    (0..500)
        .map(|i| match (i < 300, i % 2 == 0) {
            (true, true) => "tokyo",
            (true, false) => "sushi",
            (false, true) => "kyoto",
            (false, false) => "temple",
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub struct TestApp {
    pub state: Arc<AppState>,
    pub embedder: Arc<KeywordEmbedder>,
    pub generator: Arc<ScriptedGenerator>,
}

pub fn test_app(embedder: KeywordEmbedder, mode: AnswerMode) -> TestApp {
    let embedder = Arc::new(embedder);
    let generator = Arc::new(ScriptedGenerator::new(mode));
    let state = Arc::new(AppState::with_providers(
        AppConfig::default(),
        Arc::new(InMemoryNoteStore::new()),
        embedder.clone(),
        generator.clone(),
    ));

    TestApp {
        state,
        embedder,
        generator,
    }
}
