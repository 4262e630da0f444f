use async_trait::async_trait;
use std::time::Duration;

use crate::domain::errors::RagError;

#[derive(Debug)]
pub enum CacheStoreError {
    ConnectionError(String),
    BackendError(String),
}

impl std::fmt::Display for CacheStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheStoreError::ConnectionError(msg) => write!(f, "Connection error: {}", msg),
            CacheStoreError::BackendError(msg) => write!(f, "Backend error: {}", msg),
        }
    }
}

impl std::error::Error for CacheStoreError {}

impl From<CacheStoreError> for RagError {
    fn from(error: CacheStoreError) -> Self {
        RagError::Storage(error.to_string())
    }
}

/// Ordered string key-value store with per-entry TTL.
///
/// Keys are namespaced (`rag_query:`, `topic_contexts:`, `openai_usage:`).
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheStoreError>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheStoreError>;

    async fn delete(&self, key: &str) -> Result<bool, CacheStoreError>;

    /// Live keys starting with `prefix`, in key order.
    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, CacheStoreError>;
}
