//! LLM tagging of notes.

use std::collections::HashSet;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde::Deserialize;
use serde_json::json;

use crate::llm::{generate_validated, GenerationProvider, OutputSchema, StructuredError};

const MAX_TAG_CHARS: usize = 40;

#[derive(Debug, Clone, Deserialize)]
pub struct Tag {
    pub name: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct TaggingResult {
    tags: Vec<Tag>,
}

pub fn tagging_schema() -> OutputSchema {
    OutputSchema::new(
        "note_tagging",
        json!({
            "type": "object",
            "properties": {
                "tags": {
                    "type": "array",
                    "minItems": 1,
                    "maxItems": 15,
                    "items": {
                        "type": "object",
                        "properties": {
                            "name": { "type": "string" },
                            "confidence": { "type": "number", "minimum": 0.0, "maximum": 1.0 }
                        },
                        "required": ["name", "confidence"],
                        "additionalProperties": false
                    }
                }
            },
            "required": ["tags"],
            "additionalProperties": false
        }),
    )
}

fn build_prompt(title: &str, body: &str) -> String {
    format!(
        "Generate useful semantic tags for this note.\n\
         \n\
         Rules:\n\
         - 1 to 3 tags\n\
         - 1 broad tag that's more of a general category, the others should be specific and meaningful\n\
         - avoid generic tags like note, thoughts, reminder, text\n\
         - lowercase snake_case only\n\
         - 1 word per tag\n\
         - include confidence scores [0,1]\n\
         \n\
         TITLE:\n\
         {title}\n\
         \n\
         BODY:\n\
         {body}"
    )
}

fn disallowed_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z0-9\s_]").expect("valid regex"))
}

fn whitespace_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid regex"))
}

fn underscore_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"_+").expect("valid regex"))
}

/// Lowercase snake_case form of a tag, at most 40 characters. May be empty.
pub fn normalize_tag(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    let kept = disallowed_chars().replace_all(&lowered, "");
    let snake = whitespace_runs().replace_all(&kept, "_");
    let collapsed = underscore_runs().replace_all(&snake, "_");
    let capped: String = collapsed.chars().take(MAX_TAG_CHARS).collect();
    capped.trim_matches('_').to_string()
}

/// Normalize and de-duplicate in first-seen order. If nothing survives
/// normalization the raw names are kept.
pub fn clean_tags(tags: &[Tag]) -> Vec<String> {
    let mut seen = HashSet::new();
    let cleaned: Vec<String> = tags
        .iter()
        .map(|tag| normalize_tag(&tag.name))
        .filter(|name| !name.is_empty() && seen.insert(name.clone()))
        .collect();

    if cleaned.is_empty() {
        tags.iter().map(|tag| tag.name.clone()).collect()
    } else {
        cleaned
    }
}

#[derive(Clone)]
pub struct Tagger {
    generator: Arc<dyn GenerationProvider>,
    schema: OutputSchema,
}

impl Tagger {
    pub fn new(generator: Arc<dyn GenerationProvider>) -> Self {
        Self {
            generator,
            schema: tagging_schema(),
        }
    }

    pub async fn tag(&self, title: &str, body: &str) -> Result<Vec<String>, StructuredError> {
        let prompt = build_prompt(title, body);
        let result: TaggingResult =
            generate_validated(self.generator.as_ref(), &prompt, &self.schema).await?;
        Ok(clean_tags(&result.tags))
    }
}
