use async_trait::async_trait;

use crate::application::ports::ModelProviderError;

#[derive(Debug, Clone)]
pub struct EmbeddingRequest {
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct EmbeddingResponse {
    pub embedding: Vec<f32>,
    pub model_name: String,
    pub token_count: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct BatchEmbeddingRequest {
    pub texts: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct BatchEmbeddingResponse {
    /// One vector per input text, in input order.
    pub embeddings: Vec<Vec<f32>>,
    pub model_name: String,
    pub total_tokens: Option<u32>,
}

/// A remote embedding model. Every call is exactly one remote request.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn generate_embedding(
        &self,
        request: EmbeddingRequest,
    ) -> Result<EmbeddingResponse, ModelProviderError>;

    async fn generate_embeddings(
        &self,
        request: BatchEmbeddingRequest,
    ) -> Result<BatchEmbeddingResponse, ModelProviderError>;

    fn model_name(&self) -> &str;

    fn embedding_dimension(&self) -> usize;
}
