use async_trait::async_trait;

use crate::domain::value_objects::Sha256Digest;

/// Content-addressed store of previously computed embeddings, keyed by
/// `sha256(model || "::" || text)`. Lookups never fail: an unreadable entry
/// is a miss.
#[async_trait]
pub trait EmbeddingCache: Send + Sync {
    async fn get(&self, key: &Sha256Digest) -> Option<Vec<f32>>;

    async fn put(&self, key: &Sha256Digest, vector: &[f32]);
}
