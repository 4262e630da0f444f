use async_trait::async_trait;

use crate::application::ports::ModelProviderError;

/// Scores (query, passage) pairs jointly. The model is fixed for the life of
/// the process.
#[async_trait]
pub trait CrossEncoder: Send + Sync {
    /// Returns one score per passage, in the order the passages were given.
    async fn score(&self, query: &str, passages: &[String]) -> Result<Vec<f32>, ModelProviderError>;

    fn model_name(&self) -> &str;
}
