use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::CacheStore;

pub const QUERY_CACHE_PREFIX: &str = "rag_query:";
pub const RESULT_TTL: Duration = Duration::from_secs(15 * 60);
pub const EMPTY_RESULT_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Serialize)]
struct KeyMaterial<'a> {
    question: String,
    topic_ids: &'a BTreeSet<i64>,
    limit: usize,
    rerank_top_k: usize,
}

/// Deterministic key: sha256 over the normalized question, sorted topic ids
/// and retrieval parameters.
pub fn query_cache_key(
    question: &str,
    topic_ids: &BTreeSet<i64>,
    limit: usize,
    rerank_top_k: usize,
) -> String {
    let material = KeyMaterial {
        question: question.trim().to_lowercase(),
        topic_ids,
        limit,
        rerank_top_k,
    };
    // Struct fields serialize in declaration order, so the JSON is canonical.
    let canonical = serde_json::to_vec(&material).unwrap_or_default();
    let digest = Sha256::digest(&canonical);
    format!("{}{:x}", QUERY_CACHE_PREFIX, digest)
}

/// Advisory cache of whole query results. Every failure is a miss.
pub struct QueryCache {
    store: Arc<dyn CacheStore>,
    enabled: bool,
}

impl QueryCache {
    pub fn new(store: Arc<dyn CacheStore>, enabled: bool) -> Self {
        Self { store, enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if !self.enabled {
            return None;
        }

        let raw = match self.store.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Query cache read failed for {}: {}", key, e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Purging corrupt query cache entry {}: {}", key, e);
                if let Err(e) = self.store.delete(key).await {
                    tracing::warn!("Failed to purge {}: {}", key, e);
                }
                None
            }
        }
    }

    /// Drops every cached result. Used when topic configuration changes.
    pub async fn purge_all(&self) -> usize {
        let keys = match self.store.keys_with_prefix(QUERY_CACHE_PREFIX).await {
            Ok(keys) => keys,
            Err(e) => {
                tracing::warn!("Failed to list query cache entries: {}", e);
                return 0;
            }
        };

        let mut removed = 0;
        for key in keys {
            if matches!(self.store.delete(&key).await, Ok(true)) {
                removed += 1;
            }
        }
        removed
    }

    pub async fn put<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        if !self.enabled {
            return;
        }

        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Failed to serialize query result: {}", e);
                return;
            }
        };

        if let Err(e) = self.store.set(key, raw, ttl).await {
            tracing::warn!("Query cache write failed for {}: {}", key, e);
        }
    }
}
