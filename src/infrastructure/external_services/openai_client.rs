use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::ports::chat_provider::{ChatCompletion, ChatMessage, ChatRequest};
use crate::application::ports::embedding_provider::{
    BatchEmbeddingRequest, BatchEmbeddingResponse, EmbeddingRequest, EmbeddingResponse,
};
use crate::application::ports::{ChatProvider, EmbeddingProvider, ModelProviderError};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Known output dimensions of the OpenAI embedding models.
pub fn default_dimension_for(model: &str) -> Option<usize> {
    match model {
        "text-embedding-3-small" | "text-embedding-ada-002" => Some(1536),
        "text-embedding-3-large" => Some(3072),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub api_key: String,
    pub embedding_model: String,
    pub embedding_dimension: usize,
    pub timeout_secs: u64,
}

#[derive(Serialize)]
struct EmbeddingsBody<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingsReply {
    data: Vec<EmbeddingDatum>,
    model: Option<String>,
    usage: Option<EmbeddingUsage>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct EmbeddingUsage {
    total_tokens: u32,
}

#[derive(Serialize)]
struct ChatBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatReply {
    model: Option<String>,
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

/// OpenAI-compatible client serving both embeddings and chat completions.
/// One method call is one HTTP request; retries belong to the callers.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Response, ModelProviderError> {
        let response = self
            .client
            .post(self.url(path))
            .bearer_auth(&self.config.api_key)
            .json(body)
            .send()
            .await
            .map_err(ModelProviderError::from_reqwest)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        tracing::warn!("OpenAI {} returned {}: {}", path, status, message);
        Err(ModelProviderError::from_status(status.as_u16(), message))
    }

    async fn embed_texts(
        &self,
        texts: &[String],
    ) -> Result<(Vec<Vec<f32>>, String, Option<u32>), ModelProviderError> {
        if texts.is_empty() || texts.iter().any(|t| t.trim().is_empty()) {
            return Err(ModelProviderError::InvalidInput(
                "Embedding input must be non-empty text".to_string(),
            ));
        }

        let body = EmbeddingsBody {
            model: &self.config.embedding_model,
            input: texts,
        };
        let mut reply: EmbeddingsReply = self
            .post("/embeddings", &body)
            .await?
            .json()
            .await
            .map_err(ModelProviderError::from_reqwest)?;

        if reply.data.len() != texts.len() {
            return Err(ModelProviderError::InvalidResponse(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                reply.data.len()
            )));
        }

        reply.data.sort_by_key(|datum| datum.index);
        let model = reply
            .model
            .unwrap_or_else(|| self.config.embedding_model.clone());
        let embeddings = reply.data.into_iter().map(|d| d.embedding).collect();

        Ok((embeddings, model, reply.usage.map(|u| u.total_tokens)))
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiClient {
    async fn generate_embedding(
        &self,
        request: EmbeddingRequest,
    ) -> Result<EmbeddingResponse, ModelProviderError> {
        let (mut embeddings, model_name, token_count) =
            self.embed_texts(std::slice::from_ref(&request.text)).await?;

        let embedding = embeddings
            .pop()
            .ok_or_else(|| ModelProviderError::InvalidResponse("No embedding returned".into()))?;

        Ok(EmbeddingResponse {
            embedding,
            model_name,
            token_count,
        })
    }

    async fn generate_embeddings(
        &self,
        request: BatchEmbeddingRequest,
    ) -> Result<BatchEmbeddingResponse, ModelProviderError> {
        let (embeddings, model_name, total_tokens) = self.embed_texts(&request.texts).await?;

        Ok(BatchEmbeddingResponse {
            embeddings,
            model_name,
            total_tokens,
        })
    }

    fn model_name(&self) -> &str {
        &self.config.embedding_model
    }

    fn embedding_dimension(&self) -> usize {
        self.config.embedding_dimension
    }
}

#[async_trait]
impl ChatProvider for OpenAiClient {
    async fn complete(&self, request: ChatRequest) -> Result<ChatCompletion, ModelProviderError> {
        let body = ChatBody {
            model: &request.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let reply: ChatReply = self
            .post("/chat/completions", &body)
            .await?
            .json()
            .await
            .map_err(ModelProviderError::from_reqwest)?;

        let content = reply
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| ModelProviderError::InvalidResponse("No choices returned".into()))?;
        let (prompt_tokens, completion_tokens) = reply
            .usage
            .map(|u| (u.prompt_tokens, u.completion_tokens))
            .unwrap_or((0, 0));

        Ok(ChatCompletion {
            content,
            model: reply.model.unwrap_or(request.model),
            prompt_tokens,
            completion_tokens,
        })
    }
}
