use serde::{Deserialize, Serialize};

use crate::application::use_cases::{QueryResult, Source};

pub const MIN_QUESTION_CHARS: usize = 3;
pub const MAX_QUESTION_CHARS: usize = 5000;
pub const CITATION_EXCERPT_CHARS: usize = 200;

#[derive(Debug, Deserialize)]
pub struct AskRequestDto {
    pub topic_id: i64,
    pub question: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl AskRequestDto {
    pub fn validate(&self) -> Result<(), String> {
        if self.topic_id <= 0 {
            return Err("topic_id must be a positive integer".to_string());
        }
        let length = self.question.trim().chars().count();
        if !(MIN_QUESTION_CHARS..=MAX_QUESTION_CHARS).contains(&length) {
            return Err(format!(
                "question must be between {} and {} characters",
                MIN_QUESTION_CHARS, MAX_QUESTION_CHARS
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct CitationDto {
    pub title: String,
    pub content: String,
    pub score: f32,
    pub context_type: String,
    pub context_item_id: i64,
}

impl From<Source> for CitationDto {
    fn from(source: Source) -> Self {
        Self {
            title: source.title,
            content: excerpt(&source.content),
            score: source.score,
            context_type: source.context_type,
            context_item_id: source.context_item_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AskResponseDto {
    pub answer: String,
    pub citations: Vec<CitationDto>,
    pub topic_id: i64,
}

impl AskResponseDto {
    pub fn new(result: QueryResult, topic_id: i64) -> Self {
        Self {
            answer: result.answer,
            citations: result.sources.into_iter().map(CitationDto::from).collect(),
            topic_id,
        }
    }
}

/// First 200 characters followed by "..." when the content is longer.
pub fn excerpt(content: &str) -> String {
    match content.char_indices().nth(CITATION_EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}...", &content[..cut]),
        None => content.to_string(),
    }
}
