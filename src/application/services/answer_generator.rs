use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::ChatProvider;
use crate::application::ports::chat_provider::{ChatMessage, ChatRequest};
use crate::application::ports::vector_index::SearchHit;
use crate::application::services::UsageMonitor;
use crate::application::services::deadline::with_timeout;
use crate::domain::errors::RagResult;

pub const DEFAULT_GENERATE_TIMEOUT: Duration = Duration::from_secs(30);

pub const NO_RELEVANT_INFORMATION: &str = "I'm sorry, but I couldn't find any relevant information in the selected topics to answer your question.";

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant that answers questions using the provided context. Refer to sources by their [Source N] label when you use them.";

const ANSWER_INSTRUCTION: &str = "Answer the question using only the context above. If the context does not contain enough information to answer, say so clearly.";

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub system_prompt: Option<String>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.3,
            max_output_tokens: 1000,
            system_prompt: None,
        }
    }
}

/// Builds the user message: numbered passages in the given order, then the
/// question and the answering instruction.
pub fn build_prompt(question: &str, passages: &[SearchHit]) -> String {
    let context = passages
        .iter()
        .enumerate()
        .map(|(i, hit)| {
            format!(
                "[Source {}] {}\n{}",
                i + 1,
                hit.payload.title,
                hit.payload.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Context:\n\n{}\n\nQuestion: {}\n\n{}",
        context, question, ANSWER_INSTRUCTION
    )
}

pub struct AnswerGenerator {
    chat: Arc<dyn ChatProvider>,
    monitor: Arc<UsageMonitor>,
    timeout: Duration,
}

impl AnswerGenerator {
    pub fn new(chat: Arc<dyn ChatProvider>, monitor: Arc<UsageMonitor>) -> Self {
        Self {
            chat,
            monitor,
            timeout: DEFAULT_GENERATE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn generate(
        &self,
        question: &str,
        passages: &[SearchHit],
        options: &GenerationOptions,
    ) -> RagResult<String> {
        if passages.is_empty() {
            return Ok(NO_RELEVANT_INFORMATION.to_string());
        }

        let system_prompt = options
            .system_prompt
            .as_deref()
            .filter(|prompt| !prompt.trim().is_empty())
            .unwrap_or(DEFAULT_SYSTEM_PROMPT);

        let request = ChatRequest {
            model: options.model.clone(),
            messages: vec![
                ChatMessage::system(system_prompt),
                ChatMessage::user(build_prompt(question, passages)),
            ],
            temperature: options.temperature,
            max_tokens: options.max_output_tokens,
        };

        let completion =
            with_timeout(self.timeout, "chat completion", self.chat.complete(request)).await?;

        self.monitor.track_chat(
            completion.prompt_tokens,
            completion.completion_tokens,
            &completion.model,
        );

        Ok(completion.content.trim().to_string())
    }
}
