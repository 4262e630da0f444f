use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::embedding_provider::{BatchEmbeddingRequest, EmbeddingRequest};
use crate::application::ports::{EmbeddingCache, EmbeddingProvider};
use crate::application::services::deadline::with_timeout;
use crate::application::services::UsageMonitor;
use crate::domain::errors::{RagError, RagResult};
use crate::domain::value_objects::Sha256Digest;

pub const DEFAULT_EMBED_TIMEOUT: Duration = Duration::from_secs(10);

/// Produces fixed-dimension vectors for text.
///
/// Consults the embedding cache first when one is configured, issues at most
/// one remote call per invocation, reports successful calls to the usage
/// monitor and rejects vectors whose dimension differs from the model's.
pub struct EmbeddingService {
    provider: Arc<dyn EmbeddingProvider>,
    cache: Option<Arc<dyn EmbeddingCache>>,
    monitor: Arc<UsageMonitor>,
    timeout: Duration,
}

impl EmbeddingService {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, monitor: Arc<UsageMonitor>) -> Self {
        Self {
            provider,
            cache: None,
            monitor,
            timeout: DEFAULT_EMBED_TIMEOUT,
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn EmbeddingCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    pub fn dimension(&self) -> usize {
        self.provider.embedding_dimension()
    }

    pub async fn embed(&self, text: &str) -> RagResult<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(RagError::invalid_input("Cannot embed empty text"));
        }

        let key = Sha256Digest::for_embedding(self.model_name(), text);
        if let Some(vector) = self.cached(&key).await {
            return Ok(vector);
        }

        let response = with_timeout(
            self.timeout,
            "embedding",
            self.provider.generate_embedding(EmbeddingRequest {
                text: text.to_string(),
            }),
        )
        .await?;

        self.monitor
            .track_embedding(response.token_count.unwrap_or(0), &response.model_name);

        self.check_dimension(&response.embedding)?;
        self.store(&key, &response.embedding).await;

        Ok(response.embedding)
    }

    /// Vectors in input order. Cached texts are skipped in the remote call.
    pub async fn embed_batch(&self, texts: &[String]) -> RagResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Err(RagError::invalid_input("Cannot embed an empty batch"));
        }
        if let Some(position) = texts.iter().position(|t| t.trim().is_empty()) {
            return Err(RagError::invalid_input(format!(
                "Text at position {} is empty",
                position
            )));
        }

        let keys: Vec<Sha256Digest> = texts
            .iter()
            .map(|text| Sha256Digest::for_embedding(self.model_name(), text))
            .collect();

        let mut found: BTreeMap<usize, Vec<f32>> = BTreeMap::new();
        for (position, key) in keys.iter().enumerate() {
            if let Some(vector) = self.cached(key).await {
                found.insert(position, vector);
            }
        }

        let missing: Vec<usize> = (0..texts.len())
            .filter(|position| !found.contains_key(position))
            .collect();

        if !missing.is_empty() {
            let request = BatchEmbeddingRequest {
                texts: missing.iter().map(|&i| texts[i].clone()).collect(),
            };
            let response = with_timeout(
                self.timeout,
                "batch embedding",
                self.provider.generate_embeddings(request),
            )
            .await?;

            self.monitor
                .track_embedding(response.total_tokens.unwrap_or(0), &response.model_name);

            if response.embeddings.len() != missing.len() {
                return Err(RagError::permanent(format!(
                    "Embedding API returned {} vectors for {} inputs",
                    response.embeddings.len(),
                    missing.len()
                )));
            }

            for (position, vector) in missing.into_iter().zip(response.embeddings) {
                self.check_dimension(&vector)?;
                self.store(&keys[position], &vector).await;
                found.insert(position, vector);
            }
        }

        Ok(found.into_values().collect())
    }

    async fn cached(&self, key: &Sha256Digest) -> Option<Vec<f32>> {
        let cache = self.cache.as_ref()?;
        cache
            .get(key)
            .await
            .filter(|vector| vector.len() == self.dimension())
    }

    async fn store(&self, key: &Sha256Digest, vector: &[f32]) {
        if let Some(cache) = &self.cache {
            cache.put(key, vector).await;
        }
    }

    fn check_dimension(&self, vector: &[f32]) -> RagResult<()> {
        let expected = self.dimension();
        if vector.len() != expected {
            return Err(RagError::permanent(format!(
                "Embedding dimension mismatch: expected {}, got {}",
                expected,
                vector.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::{PriceTable, RateLimits};
    use crate::infrastructure::file_system::DiskEmbeddingCache;
    use crate::test_support::FakeEmbeddingProvider;

    fn monitor() -> Arc<UsageMonitor> {
        Arc::new(UsageMonitor::new(RateLimits::default(), PriceTable::default()))
    }

    #[tokio::test]
    async fn test_embed_rejects_blank_text_without_remote_call() {
        let provider = Arc::new(FakeEmbeddingProvider::new(4));
        let service = EmbeddingService::new(provider.clone(), monitor());

        let err = service.embed("   ").await.unwrap_err();
        assert!(matches!(err, RagError::InvalidInput(_)));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_embed_reports_usage() {
        let provider = Arc::new(FakeEmbeddingProvider::new(4));
        let monitor = monitor();
        let service = EmbeddingService::new(provider.clone(), monitor.clone());

        let vector = service.embed("hello world").await.unwrap();
        assert_eq!(vector.len(), 4);
        assert_eq!(monitor.snapshot().embeddings.calls, 1);
    }

    #[tokio::test]
    async fn test_transient_failure_is_not_counted() {
        let provider = Arc::new(FakeEmbeddingProvider::new(4));
        provider.fail_next_transient(1);
        let monitor = monitor();
        let service = EmbeddingService::new(provider.clone(), monitor.clone());

        let err = service.embed("hello").await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(monitor.snapshot().embeddings.calls, 0);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_permanent() {
        let provider = Arc::new(FakeEmbeddingProvider::new(4).with_output_dimension(3));
        let service = EmbeddingService::new(provider, monitor());

        let err = service.embed("hello").await.unwrap_err();
        assert!(matches!(err, RagError::PermanentExternal(_)));
    }

    #[tokio::test]
    async fn test_cache_hit_skips_remote_call() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(FakeEmbeddingProvider::new(4));
        let cache = Arc::new(DiskEmbeddingCache::new(dir.path()));
        let service = EmbeddingService::new(provider.clone(), monitor()).with_cache(cache);

        let first = service.embed("cached text").await.unwrap();
        let second = service.embed("cached text").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_batch_preserves_order_and_only_sends_misses() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(FakeEmbeddingProvider::new(4));
        let cache = Arc::new(DiskEmbeddingCache::new(dir.path()));
        let service = EmbeddingService::new(provider.clone(), monitor()).with_cache(cache);

        let warm = service.embed("beta").await.unwrap();
        let texts = vec!["alpha".to_string(), "beta".to_string(), "gamma".to_string()];
        let vectors = service.embed_batch(&texts).await.unwrap();

        assert_eq!(vectors.len(), 3);
        assert_eq!(vectors[1], warm);
        assert_eq!(vectors[0], FakeEmbeddingProvider::vector_for("alpha", 4));
        assert_eq!(vectors[2], FakeEmbeddingProvider::vector_for("gamma", 4));
        assert_eq!(provider.calls(), 2);
        assert_eq!(provider.last_batch(), vec!["alpha".to_string(), "gamma".to_string()]);
    }

    #[tokio::test]
    async fn test_batch_requires_non_empty_input() {
        let service = EmbeddingService::new(Arc::new(FakeEmbeddingProvider::new(4)), monitor());
        assert!(service.embed_batch(&[]).await.is_err());
        assert!(
            service
                .embed_batch(&["ok".to_string(), "".to_string()])
                .await
                .is_err()
        );
    }
}
